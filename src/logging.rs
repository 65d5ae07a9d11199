//! Tracing subscriber setup

use crate::config::AppEnv;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// Filter comes from `RUST_LOG` (default `info`). Production emits JSON
/// lines, everything else the human-readable format.
pub fn init(app_env: AppEnv) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match app_env {
        AppEnv::Production => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        AppEnv::Development => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
