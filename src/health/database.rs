use super::probe::{Probe, ProbeError};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Report key for the database dependency
pub const DATABASE_PROBE: &str = "db";

/// Liveness probe running `SELECT 1` against PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresProbe {
    pool: PgPool,
}

impl PostgresProbe {
    /// Build a lazily connecting pool
    ///
    /// Nothing is dialed until the first check, so the service starts even
    /// when the database is down and `/health` reports it as `error`.
    pub fn connect_lazy(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for ProbeError {
    fn from(e: sqlx::Error) -> Self {
        ProbeError::Dependency(Box::new(e))
    }
}

#[async_trait]
impl Probe for PostgresProbe {
    fn name(&self) -> &str {
        DATABASE_PROBE
    }

    async fn check(&self) -> Result<(), ProbeError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
