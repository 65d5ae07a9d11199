//! Dependency probes
//!
//! A probe checks the liveness of one external dependency. [`run_probe`]
//! bounds it with a deadline and turns every failure (error, timeout,
//! panic) into an `"error"` status so one outage never hides the others.

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

/// Reasons a dependency probe can fail
///
/// Client errors of concrete probes are boxed into [`ProbeError::Dependency`];
/// their `From` conversions live next to the probe that produces them.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Dependency(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("probe timed out after {0:?}")]
    TimedOut(Duration),

    #[error("probe panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Failed(String),
}

/// Status of a single dependency, serialized as `"ok"` / `"error"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
}

impl CheckStatus {
    pub fn is_ok(self) -> bool {
        self == CheckStatus::Ok
    }
}

/// Outcome of one probe run. Created per health request, never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCheck {
    pub name: String,
    pub status: CheckStatus,
}

/// Liveness check for a named external dependency
#[async_trait]
pub trait Probe: Send + Sync {
    /// Identifier used as the key in the health report
    fn name(&self) -> &str;

    /// Returns `Ok(())` if the dependency answered
    async fn check(&self) -> Result<(), ProbeError>;
}

/// Probe backed by an async closure
pub struct FnProbe<F> {
    name: String,
    check: F,
}

impl<F, Fut> FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

#[async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<(), ProbeError> {
        (self.check)().await
    }
}

/// Run a probe with a deadline and contain its failure
///
/// Never fails and never panics: errors, timeouts and panics inside the
/// probe are logged with the dependency name and reported as
/// [`CheckStatus::Error`].
pub async fn run_probe(probe: &dyn Probe, timeout: Duration) -> DependencyCheck {
    let guarded = AssertUnwindSafe(probe.check()).catch_unwind();

    let result = match tokio::time::timeout(timeout, guarded).await {
        Ok(Ok(result)) => result,
        Ok(Err(panic)) => Err(ProbeError::Panicked(panic_message(panic.as_ref()))),
        Err(_) => Err(ProbeError::TimedOut(timeout)),
    };

    let status = match result {
        Ok(()) => CheckStatus::Ok,
        Err(e) => {
            error!(dependency = %probe.name(), error = %e, "Health check failed");
            CheckStatus::Error
        }
    };

    DependencyCheck {
        name: probe.name().to_string(),
        status,
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "probe_test.rs"]
mod tests;
