//! Per-request HTTP metrics
//!
//! - `http_request_duration_seconds` - histogram, 10ms to 5s buckets
//! - `http_requests_total` - counter
//!
//! Both are labelled by `route`, `method` and `status` only, keeping
//! cardinality bounded by the number of route templates.

use super::registry::{Counter, Histogram, MetricsRegistry};

pub const REQUEST_DURATION_METRIC: &str = "http_request_duration_seconds";
pub const REQUESTS_TOTAL_METRIC: &str = "http_requests_total";

/// Bucket upper bounds in seconds
pub const REQUEST_DURATION_BUCKETS: [f64; 8] = [0.01, 0.05, 0.1, 0.3, 0.5, 1.0, 2.0, 5.0];

const LABELS: [&str; 3] = ["route", "method", "status"];

/// One finished request, folded into the metrics and then dropped
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTiming {
    pub route: String,
    pub method: String,
    pub status_code: u16,
    pub duration_seconds: f64,
}

/// Handles to the two fixed HTTP series
#[derive(Clone)]
pub struct HttpMetrics {
    request_duration: Histogram,
    requests_total: Counter,
}

impl HttpMetrics {
    /// Register both metrics on `registry`
    pub fn register(registry: &MetricsRegistry) -> Result<Self, prometheus::Error> {
        let request_duration = registry.histogram(
            REQUEST_DURATION_METRIC,
            "HTTP request duration in seconds",
            &LABELS,
            REQUEST_DURATION_BUCKETS.to_vec(),
        )?;
        let requests_total = registry.counter(
            REQUESTS_TOTAL_METRIC,
            "Total number of HTTP requests",
            &LABELS,
        )?;

        Ok(Self {
            request_duration,
            requests_total,
        })
    }

    /// Exactly one histogram observation and one counter increment
    pub fn record(&self, timing: &RequestTiming) {
        let status = timing.status_code.to_string();
        let labels = [timing.route.as_str(), timing.method.as_str(), status.as_str()];

        self.request_duration
            .observe(&labels, timing.duration_seconds);
        self.requests_total.increment(&labels);
    }
}
