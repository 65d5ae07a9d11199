//! Dependency health checks
//!
//! - [`Probe`] - liveness check of one dependency
//! - [`HealthAggregator`] - runs all probes and builds the `/health` report
//! - [`PostgresProbe`] / [`RedisProbe`] - the registered `db` and `queue` probes

mod aggregator;
mod cache;
mod database;
mod probe;

pub use aggregator::{HealthAggregator, HealthError, HealthReport, HealthResponse};
pub use cache::{RedisProbe, QUEUE_PROBE};
pub use database::{PostgresProbe, DATABASE_PROBE};
pub use probe::{run_probe, CheckStatus, DependencyCheck, FnProbe, Probe, ProbeError};

pub(crate) use probe::panic_message;
