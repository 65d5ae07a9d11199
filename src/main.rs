use exposure_radar::config::Config;
use exposure_radar::health::{HealthAggregator, PostgresProbe, RedisProbe};
use exposure_radar::logging;
use exposure_radar::metrics::{HttpMetrics, MetricsRegistry, RequestMetrics};
use exposure_radar::server::{build_router, serve, shutdown_signal, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(config.app_env);

    info!(env = ?config.app_env, "Starting ExposureRadar backend");

    // Single registry for the whole process, handed to the router by clone
    let metrics = MetricsRegistry::new()?;
    let http_metrics = HttpMetrics::register(&metrics)?;
    let request_metrics = RequestMetrics::new(http_metrics, config.route_fallback());

    let health = HealthAggregator::new(config.probe_timeout)
        .register(PostgresProbe::connect_lazy(&config.database_url)?)?
        .register(RedisProbe::open(&config.redis_url)?)?;
    info!(
        probes = ?health.probe_names(),
        timeout_ms = config.probe_timeout.as_millis() as u64,
        "Health probes registered"
    );

    let router = build_router(AppState::new(health, metrics, request_metrics));

    let listener = TcpListener::bind(config.listen_addr()).await?;
    serve(listener, router, shutdown_signal()).await?;

    info!("Server stopped");
    Ok(())
}
