// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    CACHE_OPERATIONS,
    RATE_LIMIT_DECISIONS,
    REQUESTS_TOTAL,
    REQUEST_DURATION,
    STORE_ERRORS,
};

/// Helper to record request metrics
pub fn record_request(method: &str, route: &str, status_code: u16, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[method, route, &status_code.to_string()])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[method, route])
        .observe(duration_secs);
}

/// Helpers to record derived cache operations
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_cache_stale() {
    CACHE_OPERATIONS.with_label_values(&["stale"]).inc();
}

pub fn record_cache_write() {
    CACHE_OPERATIONS.with_label_values(&["write"]).inc();
}

pub fn record_cache_invalidation() {
    CACHE_OPERATIONS.with_label_values(&["invalidate"]).inc();
}

/// Helper to record an absorbed store failure
pub fn record_store_error(operation: &str) {
    STORE_ERRORS.with_label_values(&[operation]).inc();
}

/// Helper to record a rate limit decision
pub fn record_rate_limit(purpose: &str, decision: &str) {
    RATE_LIMIT_DECISIONS.with_label_values(&[purpose, decision]).inc();
}
