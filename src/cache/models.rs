//! Cache statistics and stored value models.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cached value tagged with the fingerprint of the content it was derived from.
///
/// Readers compare the tag against the current content, so a value written
/// from old content is never served even if it lands after an invalidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedValue<T> {
    pub fingerprint: String,
    pub value: T,
}

/// Counters for derived cache operations in this process.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheCounters {
    /// Reads served from the cache.
    pub hits: u64,
    /// Reads that found nothing usable.
    pub misses: u64,
    /// Reads that found data derived from other content.
    pub stale: u64,
    /// Successful value writes.
    pub writes: u64,
    /// Whole-document invalidations.
    pub invalidations: u64,
}

/// Diagnostic snapshot returned by [`crate::cache::DerivedCache::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Whether the store answered the diagnostics call.
    pub connected: bool,
    pub counters: CacheCounters,
    /// Backend-specific details, empty when disconnected.
    pub store: BTreeMap<String, String>,
}
