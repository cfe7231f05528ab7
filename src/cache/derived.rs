// Derived analysis cache guarded by content fingerprints
// Author: kelexine (https://github.com/kelexine)

use crate::analysis::{Analysis, AnalysisField};
use crate::cache::keys::{analysis_key, document_keys, field_key, fingerprint_key};
use crate::cache::models::{CacheCounters, CacheStats, CachedValue};
use crate::config::CacheConfig;
use crate::fingerprint::fingerprint;
use crate::metrics;
use crate::store::KeyValueStore;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Outcome of comparing the stored fingerprint with the current content.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FingerprintCheck {
    Missing,
    Matches,
    Differs,
    /// The store could not be asked.
    Unknown,
}

/// Cache for analysis results derived from document content.
///
/// Keys per document:
/// - `fingerprint:<id>` holds the fingerprint of the content the cached data came from
/// - `analysis:<id>` holds the full [`Analysis`]
/// - `field:<name>:<id>` holds a single metric
///
/// The store has no multi-key transactions, so every read first compares the
/// stored fingerprint with the current content and every value carries its own
/// fingerprint tag. A mismatch on the fingerprint key drops all keys of the
/// document. Store failures are logged and turn into misses; nothing here
/// returns an error to the caller.
pub struct DerivedCache {
    store: Arc<dyn KeyValueStore>,
    config: CacheConfig,
    counters: Arc<RwLock<CacheCounters>>,
}

impl DerivedCache {
    /// Create a cache over a shared store handle.
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            counters: Arc::new(RwLock::new(CacheCounters::default())),
        }
    }

    /// Cached full analysis for `doc_id`, if it was derived from `content`.
    pub async fn get_full_analysis(&self, doc_id: &str, content: &str) -> Option<Analysis> {
        if !self.config.enabled {
            return None;
        }

        let current = fingerprint(content);
        if self.check_fingerprint(doc_id, &current).await != FingerprintCheck::Matches {
            self.count_miss().await;
            return None;
        }

        match self.read_value::<Analysis>(&analysis_key(doc_id), &current).await {
            Some(analysis) => {
                debug!("Cache hit for analysis of document {}", doc_id);
                self.count_hit().await;
                Some(analysis)
            }
            None => {
                // Partially evicted: fingerprint survived but the value did not
                debug!("Analysis for document {} missing behind a matching fingerprint", doc_id);
                self.count_miss().await;
                None
            }
        }
    }

    /// Store `analysis` computed from `content`. Best effort.
    pub async fn put_full_analysis(&self, doc_id: &str, content: &str, analysis: &Analysis) {
        if !self.config.enabled {
            return;
        }

        let current = fingerprint(content);
        let key = analysis_key(doc_id);
        let (value_written, fingerprint_written) = tokio::join!(
            self.write_value(&key, &current, analysis),
            self.write_fingerprint(doc_id, &current),
        );

        if value_written && fingerprint_written {
            info!("Cached analysis for document {}", doc_id);
        }
    }

    /// Cached single metric for `doc_id`, if it was derived from `content`.
    pub async fn get_field<T: DeserializeOwned>(
        &self,
        doc_id: &str,
        field: AnalysisField,
        content: &str,
    ) -> Option<T> {
        if !self.config.enabled {
            return None;
        }

        let current = fingerprint(content);
        if self.check_fingerprint(doc_id, &current).await != FingerprintCheck::Matches {
            self.count_miss().await;
            return None;
        }

        let value = self.read_value::<T>(&field_key(field, doc_id), &current).await;
        if value.is_some() {
            debug!("Cache hit for {} of document {}", field, doc_id);
            self.count_hit().await;
        } else {
            self.count_miss().await;
        }
        value
    }

    /// Store one metric computed from `content`. Best effort.
    ///
    /// The fingerprint for `content` is established first: written if absent,
    /// and if a different one is stored the whole document is invalidated
    /// before writing.
    pub async fn put_field<T: Serialize + Sync>(
        &self,
        doc_id: &str,
        field: AnalysisField,
        content: &str,
        value: &T,
    ) {
        if !self.config.enabled {
            return;
        }

        let current = fingerprint(content);
        match self.check_fingerprint(doc_id, &current).await {
            FingerprintCheck::Matches => {}
            // On drift check_fingerprint has already invalidated the document
            FingerprintCheck::Missing | FingerprintCheck::Differs => {
                if !self.write_fingerprint(doc_id, &current).await {
                    return;
                }
            }
            FingerprintCheck::Unknown => return,
        }

        if self.write_value(&field_key(field, doc_id), &current, value).await {
            debug!("Cached {} for document {}", field, doc_id);
        }
    }

    /// Delete every derived key of `doc_id`.
    ///
    /// Must run after each content-changing write and after deletion. A reader
    /// that fetched the old content just before the write can still repopulate
    /// stale data; the fingerprint tag keeps it from being served.
    pub async fn invalidate_document(&self, doc_id: &str) {
        let keys = document_keys(doc_id);
        let results = join_all(keys.iter().map(|key| self.store.delete(key))).await;

        let failures = results.iter().filter(|r| r.is_err()).count();
        if failures > 0 {
            for err in results.into_iter().filter_map(Result::err) {
                warn!("Failed to invalidate cache for document {}: {}", doc_id, err);
                metrics::record_store_error("delete");
            }
            return;
        }

        info!("Invalidated all caches for document {}", doc_id);
        metrics::record_cache_invalidation();
        self.counters.write().await.invalidations += 1;
    }

    /// Whether the store answers.
    pub async fn ping(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache health check failed: {}", e);
                metrics::record_store_error("ping");
                false
            }
        }
    }

    /// Diagnostic snapshot. Never fails; a store error yields `connected: false`.
    pub async fn stats(&self) -> CacheStats {
        let counters = self.counters.read().await.clone();
        match self.store.info().await {
            Ok(store) => CacheStats {
                connected: true,
                counters,
                store,
            },
            Err(e) => {
                warn!("Failed to get cache stats: {}", e);
                metrics::record_store_error("info");
                CacheStats {
                    connected: false,
                    counters,
                    store: Default::default(),
                }
            }
        }
    }

    /// Compare the stored fingerprint with `current`, invalidating on drift.
    async fn check_fingerprint(&self, doc_id: &str, current: &str) -> FingerprintCheck {
        let stored = match self.store.get(&fingerprint_key(doc_id)).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to read fingerprint for document {}: {}", doc_id, e);
                metrics::record_store_error("get");
                return FingerprintCheck::Unknown;
            }
        };

        match stored {
            None => FingerprintCheck::Missing,
            Some(raw) if raw == current.as_bytes() => FingerprintCheck::Matches,
            Some(_) => {
                info!("Content changed for document {}, invalidating cache", doc_id);
                metrics::record_cache_stale();
                self.counters.write().await.stale += 1;
                self.invalidate_document(doc_id).await;
                FingerprintCheck::Differs
            }
        }
    }

    /// Read and decode a tagged value; anything unusable reads as `None`.
    async fn read_value<T: DeserializeOwned>(&self, key: &str, current: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cache key {}: {}", key, e);
                metrics::record_store_error("get");
                return None;
            }
        };

        let cached: CachedValue<T> = match serde_json::from_slice(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Discarding undecodable cache value at {}: {}", key, e);
                return None;
            }
        };

        if cached.fingerprint != current {
            debug!("Value at {} was derived from other content", key);
            metrics::record_cache_stale();
            self.counters.write().await.stale += 1;
            return None;
        }

        Some(cached.value)
    }

    async fn write_value<T: Serialize + Sync>(&self, key: &str, current: &str, value: &T) -> bool {
        let tagged = CachedValue {
            fingerprint: current.to_string(),
            value,
        };
        let payload = match serde_json::to_vec(&tagged) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode cache value for {}: {}", key, e);
                return false;
            }
        };

        match self
            .store
            .set_with_ttl(key, &payload, self.config.analysis_ttl_seconds)
            .await
        {
            Ok(()) => {
                metrics::record_cache_write();
                self.counters.write().await.writes += 1;
                true
            }
            Err(e) => {
                warn!("Failed to write cache key {}: {}", key, e);
                metrics::record_store_error("set");
                false
            }
        }
    }

    async fn write_fingerprint(&self, doc_id: &str, current: &str) -> bool {
        let key = fingerprint_key(doc_id);
        match self
            .store
            .set_with_ttl(&key, current.as_bytes(), self.config.analysis_ttl_seconds)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to write fingerprint for document {}: {}", doc_id, e);
                metrics::record_store_error("set");
                false
            }
        }
    }

    async fn count_hit(&self) {
        metrics::record_cache_hit();
        self.counters.write().await.hits += 1;
    }

    async fn count_miss(&self) {
        metrics::record_cache_miss();
        self.counters.write().await.misses += 1;
    }
}
