//! Tests for the HTTP endpoints

use super::*;
use crate::health::{FnProbe, HealthAggregator, ProbeError};
use crate::metrics::{HttpMetrics, MetricsRegistry, RequestMetrics, RouteFallback};
use axum::routing::get;
use std::net::SocketAddr;
use std::time::Duration;

fn probe(name: &'static str, healthy: bool) -> impl crate::health::Probe {
    FnProbe::new(name, move || async move {
        if healthy {
            Ok(())
        } else {
            Err(ProbeError::Failed(format!("{name} is down")))
        }
    })
}

fn test_state(db_ok: bool, queue_ok: bool, fallback: RouteFallback) -> AppState {
    let metrics = MetricsRegistry::new().expect("create metrics");
    let http = HttpMetrics::register(&metrics).expect("register http metrics");
    let health = HealthAggregator::new(Duration::from_millis(500))
        .register(probe("db", db_ok))
        .expect("register db")
        .register(probe("queue", queue_ok))
        .expect("register queue");
    AppState::new(health, metrics, RequestMetrics::new(http, fallback))
}

type ServerHandle = tokio::task::JoinHandle<std::io::Result<()>>;

/// Bind an ephemeral port and serve `router` in the background
async fn spawn_server(router: Router) -> (SocketAddr, ServerHandle) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(serve(listener, router, std::future::pending()));
    (addr, handle)
}

async fn spawn_app(
    db_ok: bool,
    queue_ok: bool,
    fallback: RouteFallback,
) -> (SocketAddr, ServerHandle) {
    spawn_server(build_router(test_state(db_ok, queue_ok, fallback))).await
}

async fn get_text(addr: SocketAddr, path: &str) -> (u16, String) {
    let response = reqwest::Client::new()
        .get(format!("http://{}{}", addr, path))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("request should complete");
    let status = response.status().as_u16();
    (status, response.text().await.expect("body"))
}

/// Find the sample line for `prefix` carrying all label fragments
fn sample_line<'a>(output: &'a str, prefix: &str, fragments: &[&str]) -> Option<&'a str> {
    output
        .lines()
        .find(|l| l.starts_with(prefix) && fragments.iter().all(|f| l.contains(f)))
}

#[tokio::test]
async fn test_health_returns_200_when_all_dependencies_ok() {
    // ARRANGE
    let (addr, handle) = spawn_app(true, true, RouteFallback::Unknown).await;

    // ACT
    let (status, body) = get_text(addr, "/health").await;

    // ASSERT
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(
        json,
        serde_json::json!({"status": "ok", "checks": {"db": "ok", "queue": "ok"}})
    );

    handle.abort();
}

#[tokio::test]
async fn test_health_returns_503_on_partial_outage() {
    let (addr, handle) = spawn_app(false, true, RouteFallback::Unknown).await;

    let (status, body) = get_text(addr, "/health").await;

    assert_eq!(status, 503, "partial outage should be Service Unavailable");
    let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(
        json,
        serde_json::json!({"status": "error", "checks": {"db": "error", "queue": "ok"}})
    );

    handle.abort();
}

#[tokio::test]
async fn test_metrics_returns_prometheus_format() {
    let (addr, handle) = spawn_app(true, true, RouteFallback::Unknown).await;

    // Produce a sample so the HTTP families appear in the output
    get_text(addr, "/health").await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/metrics", addr))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to connect to metrics endpoint");

    assert_eq!(response.status(), 200, "Metrics should return 200");
    let content_type = response
        .headers()
        .get("content-type")
        .expect("should have content-type")
        .to_str()
        .expect("content-type should be string")
        .to_string();
    assert!(
        content_type.starts_with("text/plain") && content_type.contains("version=0.0.4"),
        "unexpected content type {content_type}"
    );

    let body = response.text().await.expect("should have body");
    let line = sample_line(
        &body,
        "http_requests_total{",
        &["route=\"/health\"", "method=\"GET\"", "status=\"200\""],
    )
    .expect("health request should be counted");
    assert!(line.ends_with(" 1"), "got {line}");
    assert!(body.contains("http_request_duration_seconds_bucket{"));
    assert!(body.contains("http_request_duration_seconds_sum{"));
    assert!(body.contains("http_request_duration_seconds_count{"));

    handle.abort();
}

#[tokio::test]
async fn test_api_prefix_serves_service_info() {
    let (addr, handle) = spawn_app(true, true, RouteFallback::Unknown).await;

    let (status, body) = get_text(addr, "/api/v1").await;

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(json["service"], "exposure-radar");

    let (status, _) = get_text(addr, "/api/v1/health").await;
    assert_eq!(status, 404, "health must not live under the API prefix");

    handle.abort();
}

#[tokio::test]
async fn test_unmatched_paths_share_one_bounded_label() {
    let (addr, handle) = spawn_app(true, true, RouteFallback::Unknown).await;

    let (status, body) = get_text(addr, "/users/1").await;
    assert_eq!(status, 404);
    assert_eq!(body, r#"{"error":"not found"}"#);
    get_text(addr, "/users/2").await;

    let (_, metrics) = get_text(addr, "/metrics").await;
    let line = sample_line(
        &metrics,
        "http_requests_total{",
        &["route=\"unknown\"", "status=\"404\""],
    )
    .expect("unmatched requests should be counted");
    assert!(line.ends_with(" 2"), "got {line}");
    assert!(!metrics.contains("/users/1"));

    handle.abort();
}

#[tokio::test]
async fn test_raw_path_fallback_when_enabled() {
    let (addr, handle) = spawn_app(true, true, RouteFallback::RawPath).await;

    get_text(addr, "/users/7").await;

    let (_, metrics) = get_text(addr, "/metrics").await;
    assert!(sample_line(&metrics, "http_requests_total{", &["route=\"/users/7\""]).is_some());

    handle.abort();
}

#[tokio::test]
async fn test_route_template_is_used_as_label() {
    let state = test_state(true, true, RouteFallback::RawPath);
    let router = instrument(
        observability_routes()
            .route("/scans/{id}", get(|| async { "scan" }))
            .with_state(state.clone()),
        state.request_metrics.clone(),
    );
    let (addr, handle) = spawn_server(router).await;

    get_text(addr, "/scans/1").await;
    get_text(addr, "/scans/2").await;

    let (_, metrics) = get_text(addr, "/metrics").await;
    let line = sample_line(&metrics, "http_requests_total{", &["route=\"/scans/{id}\""])
        .expect("templated route should be counted");
    assert!(line.ends_with(" 2"), "got {line}");

    handle.abort();
}

#[tokio::test]
async fn test_panicking_handler_is_recorded_as_500() {
    let state = test_state(true, true, RouteFallback::Unknown);
    let router = instrument(
        observability_routes()
            .route(
                "/explode",
                get(|| async {
                    let broken = true;
                    if broken {
                        panic!("handler bug");
                    }
                    "unreachable"
                }),
            )
            .with_state(state.clone()),
        state.request_metrics.clone(),
    );
    let (addr, handle) = spawn_server(router).await;

    let (status, _) = get_text(addr, "/explode").await;
    assert_eq!(status, 500);

    // Server keeps serving after the panic
    let (_, metrics) = get_text(addr, "/metrics").await;
    let line = sample_line(
        &metrics,
        "http_requests_total{",
        &["route=\"/explode\"", "status=\"500\""],
    )
    .expect("panicking request should be counted");
    assert!(line.ends_with(" 1"), "got {line}");

    handle.abort();
}

#[tokio::test]
async fn test_serve_stops_on_shutdown_signal() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let router = build_router(test_state(true, true, RouteFallback::Unknown));

    let handle = tokio::spawn(serve(listener, router, async move {
        let _ = rx.await;
    }));
    tx.send(()).expect("send shutdown");

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop")
        .expect("server task should not panic");
    assert!(result.is_ok());
}
