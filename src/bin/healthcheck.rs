//! Container health check
//!
//! Queries `/health` of a running server and exits 0 when the report is
//! `ok`, 1 otherwise. Target from `HEALTHCHECK_URL`, default
//! `http://127.0.0.1:$PORT`.

use exposure_radar::client::{local_base_url, HealthClient};
use exposure_radar::config::{AppEnv, Config, ConfigError, DEFAULT_PORT};
use exposure_radar::logging;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings the check needs, with defaults when the environment is invalid
fn settings(loaded: &Result<Config, ConfigError>) -> (AppEnv, u16) {
    match loaded {
        Ok(config) => (config.app_env, config.port),
        Err(_) => (AppEnv::Development, DEFAULT_PORT),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let loaded = Config::from_env();
    let (app_env, port) = settings(&loaded);
    logging::init(app_env);

    if let Err(e) = &loaded {
        warn!(error = %e, port, "Invalid configuration, using defaults");
    }

    let base_url = std::env::var("HEALTHCHECK_URL").unwrap_or_else(|_| local_base_url(port));

    let client = HealthClient::new(&base_url);
    match client.fetch(REQUEST_TIMEOUT).await {
        Ok(report) if report.status.is_ok() => {
            info!(url = %client.base_url(), "Service healthy");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            error!(url = %client.base_url(), checks = ?report.checks, "Service unhealthy");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(url = %client.base_url(), error = %e, "Health check request failed");
            ExitCode::FAILURE
        }
    }
}
