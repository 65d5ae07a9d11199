//! Prometheus metrics for the HTTP service
//!
//! - [`MetricsRegistry`] - registry, counters, histograms and text exposition
//! - [`HttpMetrics`] - request duration histogram and request counter
//! - [`track_http_metrics`] - middleware feeding every request into them

mod http;
mod middleware;
mod registry;

pub use http::{
    HttpMetrics, RequestTiming, REQUESTS_TOTAL_METRIC, REQUEST_DURATION_BUCKETS,
    REQUEST_DURATION_METRIC,
};
pub use middleware::{route_label, track_http_metrics, RequestMetrics, RouteFallback, UNKNOWN_ROUTE};
pub use registry::{Counter, Histogram, MetricsRegistry};
