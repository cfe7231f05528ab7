// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, HistogramVec, Opts, Registry, TextEncoder,
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================

    /// Total number of HTTP requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "route", "status_code"],
        REGISTRY
    ).unwrap();

    /// Request duration histogram
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("http_request_duration_seconds", "Request duration in seconds")
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "route"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// Derived cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("cache_operations_total", "Total derived cache operations"),
        &["operation"], // operation: hit, miss, stale, write, invalidate
        REGISTRY
    ).unwrap();

    /// Store calls that failed and were absorbed
    pub static ref STORE_ERRORS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("store_errors_total", "Total failed key-value store calls"),
        &["operation"], // operation: get, set, delete, increment, ping, info
        REGISTRY
    ).unwrap();

    // ============================================================================
    // RATE LIMIT METRICS
    // ============================================================================

    /// Admission decisions
    pub static ref RATE_LIMIT_DECISIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("rate_limit_decisions_total", "Total rate limit decisions"),
        &["purpose", "decision"], // decision: allowed, rejected, fail_open
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Vec metrics only show up once a label set has been touched
        CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
        STORE_ERRORS.with_label_values(&["get"]).inc();
        RATE_LIMIT_DECISIONS.with_label_values(&["general", "allowed"]).inc();
        REQUESTS_TOTAL.with_label_values(&["GET", "/health", "200"]).inc();

        let metrics = gather_metrics();
        assert!(metrics.contains("cache_operations_total"));
        assert!(metrics.contains("store_errors_total"));
        assert!(metrics.contains("rate_limit_decisions_total"));
        assert!(metrics.contains("http_requests_total"));
    }
}
