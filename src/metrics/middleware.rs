//! Request instrumentation middleware
//!
//! Wraps every request, times it from dispatch until the handler produced
//! a response, and records one [`RequestTiming`] into [`HttpMetrics`].

use super::http::{HttpMetrics, RequestTiming};
use crate::health::panic_message;
use crate::server::ApiError;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, error};

/// Route label used when nothing better is available
pub const UNKNOWN_ROUTE: &str = "unknown";

/// Route label for requests that matched no route template
///
/// The default is the fixed `"unknown"` label, not the raw request path a
/// plain path fallback would give. Unmatched paths are client-controlled, so
/// labelling them verbatim lets any caller grow the label set without bound.
/// Deployments that want the raw path opt in with
/// `METRICS_RAW_PATH_FALLBACK=true`, which selects [`RouteFallback::RawPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteFallback {
    /// Always the fixed `"unknown"` label
    #[default]
    Unknown,
    /// The raw request path. Unbounded cardinality if clients probe
    /// arbitrary paths.
    RawPath,
}

/// State for [`track_http_metrics`]
#[derive(Clone)]
pub struct RequestMetrics {
    http: HttpMetrics,
    fallback: RouteFallback,
}

impl RequestMetrics {
    pub fn new(http: HttpMetrics, fallback: RouteFallback) -> Self {
        Self { http, fallback }
    }
}

/// Resolve the `route` label: matched template, then the configured fallback
pub fn route_label(request: &Request, fallback: RouteFallback) -> String {
    if let Some(matched) = request.extensions().get::<MatchedPath>() {
        return matched.as_str().to_string();
    }

    match fallback {
        RouteFallback::RawPath if !request.uri().path().is_empty() => {
            request.uri().path().to_string()
        }
        _ => UNKNOWN_ROUTE.to_string(),
    }
}

/// Axum middleware recording duration and count for every request
///
/// A panicking handler is answered with 500 and still recorded; the
/// panic does not propagate to the connection task.
pub async fn track_http_metrics(
    State(metrics): State<RequestMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().as_str().to_string();
    let route = route_label(&request, metrics.fallback);

    let response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            error!(
                route = %route,
                method = %method,
                panic = %panic_message(panic.as_ref()),
                "Request handler panicked"
            );
            ApiError::internal("internal server error").into_response()
        }
    };

    let timing = RequestTiming {
        route,
        method,
        status_code: response.status().as_u16(),
        duration_seconds: start.elapsed().as_secs_f64(),
    };
    metrics.http.record(&timing);

    debug!(
        route = %timing.route,
        method = %timing.method,
        status = timing.status_code,
        duration_ms = timing.duration_seconds * 1000.0,
        "Request processed"
    );

    response
}
