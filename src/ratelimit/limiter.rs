// Fixed-window rate limiter over the shared store
// Author: kelexine (https://github.com/kelexine)

use super::policy::{Identity, RateLimitPolicy};
use crate::cache::keys::rate_window_key;
use crate::metrics;
use crate::store::KeyValueStore;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// The fixed window containing a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// `floor(now / window_ms)`.
    pub index: i64,
    /// First millisecond of the next window.
    pub reset_at_ms: i64,
}

impl Window {
    pub fn containing(now_ms: i64, window_ms: u64) -> Self {
        let window_ms = window_ms.max(1) as i64;
        let index = now_ms.div_euclid(window_ms);
        Self {
            index,
            reset_at_ms: (index + 1) * window_ms,
        }
    }
}

/// Result of one admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    pub reset_at_ms: i64,
    /// Time until the window resets, set only on rejection.
    pub retry_after_ms: Option<u64>,
    /// Admitted without consulting the store.
    pub degraded: bool,
}

impl Decision {
    fn fail_open(policy: &RateLimitPolicy, window: Window) -> Self {
        Self {
            allowed: true,
            limit: policy.max_requests,
            remaining: policy.max_requests,
            reset_at_ms: window.reset_at_ms,
            retry_after_ms: None,
            degraded: true,
        }
    }

    pub fn reset_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.reset_at_ms)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Retry delay in whole seconds, rounded up.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after_ms.map(|ms| ms.div_ceil(1000))
    }
}

/// Per-identity fixed-window request counter.
///
/// A counter lives under `ratewindow:<purpose>:<identity>:<window index>`, so a
/// new window starts from zero without any reset step. Store TTL is only a
/// cleanup bound. When the store cannot be reached the request is admitted.
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// Check and count one request for `identity` under `policy`.
    pub async fn admit(&self, policy: &RateLimitPolicy, identity: &Identity) -> Decision {
        self.admit_at(policy, identity, Utc::now().timestamp_millis())
            .await
    }

    /// [`RateLimiter::admit`] at an explicit time.
    pub async fn admit_at(
        &self,
        policy: &RateLimitPolicy,
        identity: &Identity,
        now_ms: i64,
    ) -> Decision {
        let window = Window::containing(now_ms, policy.window_ms);
        if !self.enabled {
            return Decision {
                degraded: false,
                ..Decision::fail_open(policy, window)
            };
        }

        let identity = identity.to_string();
        let key = rate_window_key(&policy.purpose, &identity, window.index);
        let ttl_seconds = policy.window_ms.div_ceil(1000).max(1);

        let count = match self.store.increment(&key, ttl_seconds).await {
            Ok(count) => count.max(0) as u64,
            Err(e) => {
                warn!(
                    "Rate limiting degraded for {} ({}): {}, admitting request",
                    identity, policy.purpose, e
                );
                metrics::record_store_error("increment");
                metrics::record_rate_limit(&policy.purpose, "fail_open");
                return Decision::fail_open(policy, window);
            }
        };

        if count > policy.max_requests {
            let retry_after_ms = (window.reset_at_ms - now_ms).max(0) as u64;
            warn!("Rate limit exceeded for {} ({})", identity, policy.purpose);
            metrics::record_rate_limit(&policy.purpose, "rejected");
            return Decision {
                allowed: false,
                limit: policy.max_requests,
                remaining: 0,
                reset_at_ms: window.reset_at_ms,
                retry_after_ms: Some(retry_after_ms),
                degraded: false,
            };
        }

        debug!(
            "Admitted {} ({}): {}/{}",
            identity, policy.purpose, count, policy.max_requests
        );
        metrics::record_rate_limit(&policy.purpose, "allowed");
        Decision {
            allowed: true,
            limit: policy.max_requests,
            remaining: policy.max_requests - count,
            reset_at_ms: window.reset_at_ms,
            retry_after_ms: None,
            degraded: false,
        }
    }
}
