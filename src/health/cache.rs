use super::probe::{Probe, ProbeError};
use async_trait::async_trait;

/// Report key for the cache/queue dependency
pub const QUEUE_PROBE: &str = "queue";

/// Liveness probe sending `PING` to Redis
///
/// Opens a fresh connection per check; the client itself never dials.
#[derive(Debug, Clone)]
pub struct RedisProbe {
    client: redis::Client,
}

impl RedisProbe {
    pub fn open(redis_url: &str) -> Result<Self, redis::RedisError> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
        })
    }
}

impl From<redis::RedisError> for ProbeError {
    fn from(e: redis::RedisError) -> Self {
        ProbeError::Dependency(Box::new(e))
    }
}

#[async_trait]
impl Probe for RedisProbe {
    fn name(&self) -> &str {
        QUEUE_PROBE
    }

    async fn check(&self) -> Result<(), ProbeError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(ProbeError::Failed(format!("unexpected PING reply: {reply}")))
        }
    }
}
