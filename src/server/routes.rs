//! HTTP routes
//!
//! - `GET /health` - aggregated dependency health, 200 or 503
//! - `GET /metrics` - Prometheus text exposition
//! - `GET /api/v1` - service info
//!
//! `/health` and `/metrics` sit outside the `/api/v1` prefix so scrapers
//! and orchestrators reach them without versioning or auth.

use super::error::ApiError;
use crate::health::{HealthAggregator, HealthReport};
use crate::metrics::{track_http_metrics, MetricsRegistry, RequestMetrics};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// Prefix for business endpoints
pub const API_PREFIX: &str = "/api/v1";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub health: Arc<HealthAggregator>,
    pub metrics: MetricsRegistry,
    pub request_metrics: RequestMetrics,
}

impl AppState {
    pub fn new(
        health: HealthAggregator,
        metrics: MetricsRegistry,
        request_metrics: RequestMetrics,
    ) -> Self {
        Self {
            health: Arc::new(health),
            metrics,
            request_metrics,
        }
    }
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    service: &'static str,
    version: &'static str,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let response = state.health.get_health().await;
    (response.status_code, Json(response.report))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.serialize() {
        Ok(body) => (
            [(header::CONTENT_TYPE, state.metrics.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            ApiError::internal("failed to encode metrics").into_response()
        }
    }
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// `/health` and `/metrics`
pub fn observability_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
}

/// Business endpoints under [`API_PREFIX`]
pub fn api_routes() -> Router<AppState> {
    Router::new().route(API_PREFIX, get(service_info))
}

/// Wrap every route of `router`, fallback included, in the metrics middleware
pub fn instrument(router: Router, request_metrics: RequestMetrics) -> Router {
    router.layer(middleware::from_fn_with_state(
        request_metrics,
        track_http_metrics,
    ))
}

/// Full application router
pub fn build_router(state: AppState) -> Router {
    let request_metrics = state.request_metrics.clone();
    let router = observability_routes()
        .merge(api_routes())
        .fallback(not_found)
        .with_state(state);
    instrument(router, request_metrics)
}
