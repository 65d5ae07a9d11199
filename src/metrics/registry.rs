//! Prometheus metrics registry
//!
//! Explicitly constructed and cloned by handle; there is no global
//! registry. Counters and histograms are thread-safe atomics, so handles
//! can be shared across request tasks without extra locking.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::warn;

/// Metrics registry with process metrics pre-registered
///
/// Clone is cheap (Arc internally).
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
}

impl MetricsRegistry {
    /// Create an isolated registry
    ///
    /// On Linux the process collector (CPU seconds, resident and virtual
    /// memory, open fds, start time) is registered up front.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self { registry })
    }

    /// Register a counter family keyed by `label_names`
    pub fn counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Counter, prometheus::Error> {
        let vec = IntCounterVec::new(Opts::new(name, help), label_names)?;
        self.registry.register(Box::new(vec.clone()))?;
        Ok(Counter { vec })
    }

    /// Register a histogram family with explicit bucket upper bounds
    pub fn histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: Vec<f64>,
    ) -> Result<Histogram, prometheus::Error> {
        let vec = HistogramVec::new(HistogramOpts::new(name, help).buckets(buckets), label_names)?;
        self.registry.register(Box::new(vec.clone()))?;
        Ok(Histogram { vec })
    }

    /// Encode all metrics to the Prometheus text exposition format
    pub fn serialize(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Failed to encode metrics as UTF-8: {}", e))
        })
    }

    /// MIME type of [`serialize`](Self::serialize) output
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

/// Monotonic counter family
#[derive(Clone)]
pub struct Counter {
    vec: IntCounterVec,
}

impl Counter {
    /// Add 1 to the series for `label_values`, creating it on first use
    ///
    /// A label count mismatch is logged and dropped rather than panicking.
    pub fn increment(&self, label_values: &[&str]) {
        match self.vec.get_metric_with_label_values(label_values) {
            Ok(counter) => counter.inc(),
            Err(e) => warn!(error = %e, "Dropping counter sample"),
        }
    }

    /// Current value of the series for `label_values`
    ///
    /// An absent series reads as 0 (and is created at 0). A label count
    /// mismatch also reads as 0.
    pub fn get(&self, label_values: &[&str]) -> u64 {
        self.vec
            .get_metric_with_label_values(label_values)
            .map(|counter| counter.get())
            .unwrap_or(0)
    }
}

/// Histogram family
#[derive(Clone)]
pub struct Histogram {
    vec: HistogramVec,
}

impl Histogram {
    /// Record `value`: every bucket whose bound is >= `value` is
    /// incremented, the sum grows by `value` and the count by one.
    pub fn observe(&self, label_values: &[&str], value: f64) {
        match self.vec.get_metric_with_label_values(label_values) {
            Ok(histogram) => histogram.observe(value),
            Err(e) => warn!(error = %e, "Dropping histogram sample"),
        }
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
