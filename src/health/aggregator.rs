//! Aggregated health report
//!
//! Runs every registered probe concurrently and folds the outcomes into a
//! single report. No caching and no retries: each call probes from scratch.

use super::probe::{run_probe, CheckStatus, DependencyCheck, Probe};
use axum::http::StatusCode;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HealthError {
    #[error("a probe named {0:?} is already registered")]
    DuplicateProbe(String),
}

/// Overall status plus the per-dependency breakdown
///
/// `status` is `ok` iff every entry in `checks` is `ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: CheckStatus,
    pub checks: BTreeMap<String, CheckStatus>,
}

impl HealthReport {
    pub fn from_checks(checks: impl IntoIterator<Item = DependencyCheck>) -> Self {
        let checks: BTreeMap<String, CheckStatus> =
            checks.into_iter().map(|c| (c.name, c.status)).collect();

        let status = if checks.values().all(|s| s.is_ok()) {
            CheckStatus::Ok
        } else {
            CheckStatus::Error
        };

        Self { status, checks }
    }

    /// 200 when healthy, 503 otherwise
    pub fn status_code(&self) -> StatusCode {
        if self.status.is_ok() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Health report together with the transport status it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status_code: StatusCode,
    pub report: HealthReport,
}

/// Fixed set of dependency probes
///
/// Probes are registered once at startup; the report always contains
/// exactly the registered names.
#[derive(Clone)]
pub struct HealthAggregator {
    probes: Vec<Arc<dyn Probe>>,
    timeout: Duration,
}

impl HealthAggregator {
    /// Create an aggregator with no probes and the given per-probe deadline
    pub fn new(timeout: Duration) -> Self {
        Self {
            probes: Vec::new(),
            timeout,
        }
    }

    /// Add a probe, rejecting duplicate names
    pub fn register<P>(mut self, probe: P) -> Result<Self, HealthError>
    where
        P: Probe + 'static,
    {
        if self.probes.iter().any(|p| p.name() == probe.name()) {
            return Err(HealthError::DuplicateProbe(probe.name().to_string()));
        }
        self.probes.push(Arc::new(probe));
        Ok(self)
    }

    pub fn probe_names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Probe every dependency concurrently and build the response
    ///
    /// Total latency is bounded by the slowest probe (itself bounded by the
    /// deadline), not the sum.
    pub async fn get_health(&self) -> HealthResponse {
        let checks = join_all(
            self.probes
                .iter()
                .map(|probe| run_probe(probe.as_ref(), self.timeout)),
        )
        .await;

        let report = HealthReport::from_checks(checks);

        HealthResponse {
            status_code: report.status_code(),
            report,
        }
    }
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
