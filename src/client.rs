//! Client for the `/health` contract
//!
//! `/health` answers 503 with a valid report when a dependency is down,
//! so both 200 and 503 are treated as payload responses.

use crate::health::HealthReport;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    UnexpectedStatus(StatusCode),
}

/// Base URL of a service listening on `port` of the local host
pub fn local_base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}", port)
}

pub struct HealthClient {
    base_url: String,
    http: reqwest::Client,
}

impl HealthClient {
    /// Create a client for `base_url`; trailing slashes are dropped
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current health report
    pub async fn fetch(&self, timeout: Duration) -> Result<HealthReport, ClientError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::SERVICE_UNAVAILABLE => Ok(response.json().await?),
            status => Err(ClientError::UnexpectedStatus(status)),
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
