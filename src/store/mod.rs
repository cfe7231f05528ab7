//! Shared key-value store abstraction.
//!
//! Both the derived cache and the rate limiter talk to one logical store
//! through [`KeyValueStore`]. The handle is built once at startup and
//! injected into every component that needs it.
//!
//! # Implementations
//!
//! - [`RedisStore`]: networked Redis (or compatible) store, every call bounded by a timeout.
//! - [`MemoryStore`]: process-local store for single-node runs and tests.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{AppError, Result, StoreResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Client contract for the shared TTL key-value store.
///
/// Every call is a round trip that may fail; callers decide how a failure
/// degrades. The store offers per-key consistency only.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw value under `key`, `None` when absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write `value` under `key`, expiring after `ttl_seconds`.
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl_seconds: u64) -> StoreResult<()>;

    /// Remove `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Liveness check.
    async fn ping(&self) -> StoreResult<()>;

    /// Add one to the decimal counter under `key` and return the new value.
    ///
    /// The default is a plain read-then-write, so concurrent callers can lose
    /// updates. Implementations with a native atomic increment override it.
    async fn increment(&self, key: &str, ttl_seconds: u64) -> StoreResult<i64> {
        let current = match self.get(key).await? {
            Some(raw) => std::str::from_utf8(&raw)
                .ok()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(0),
            None => 0,
        };
        let next = current + 1;
        self.set_with_ttl(key, next.to_string().as_bytes(), ttl_seconds)
            .await?;
        Ok(next)
    }

    /// Backend-specific diagnostics.
    async fn info(&self) -> StoreResult<BTreeMap<String, String>> {
        Ok(BTreeMap::new())
    }
}

/// Build the store selected by configuration.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-process memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redis => {
            let store = RedisStore::connect(config)
                .await
                .map_err(|e| AppError::Config(format!("Could not connect to store: {}", e)))?;
            Ok(Arc::new(store))
        }
    }
}
