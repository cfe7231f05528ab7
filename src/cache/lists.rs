// Per-user document list cache
// Author: kelexine (https://github.com/kelexine)

use crate::cache::keys::user_documents_key;
use crate::metrics;
use crate::store::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Caches the list of documents owned by each user under `user_documents:<owner>`.
///
/// Unlike the derived cache there is no fingerprint: the owning service keeps
/// the list in step with its writes. Failures read as misses.
pub struct ListCache {
    store: Arc<dyn KeyValueStore>,
    ttl_seconds: u64,
    enabled: bool,
}

impl ListCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl_seconds: u64, enabled: bool) -> Self {
        Self {
            store,
            ttl_seconds,
            enabled,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, owner_id: &str) -> Option<Vec<T>> {
        if !self.enabled {
            return None;
        }

        let key = user_documents_key(owner_id);
        match self.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_slice(&raw) {
                Ok(list) => {
                    debug!("Cache hit for documents of user {}", owner_id);
                    Some(list)
                }
                Err(e) => {
                    warn!("Discarding undecodable document list for user {}: {}", owner_id, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to get cached documents for user {}: {}", owner_id, e);
                metrics::record_store_error("get");
                None
            }
        }
    }

    pub async fn put<T: Serialize + Sync>(&self, owner_id: &str, list: &[T]) {
        if !self.enabled {
            return;
        }

        let payload = match serde_json::to_vec(list) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode document list for user {}: {}", owner_id, e);
                return;
            }
        };

        let key = user_documents_key(owner_id);
        if let Err(e) = self.store.set_with_ttl(&key, &payload, self.ttl_seconds).await {
            warn!("Failed to cache documents for user {}: {}", owner_id, e);
            metrics::record_store_error("set");
        } else {
            debug!("Cached {} documents for user {}", list.len(), owner_id);
        }
    }

    /// Rewrite the cached list with `edit`, only if a list is cached.
    pub async fn update<T, F>(&self, owner_id: &str, edit: F)
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce(&mut Vec<T>) + Send,
    {
        if let Some(mut list) = self.get::<T>(owner_id).await {
            edit(&mut list);
            self.put(owner_id, &list).await;
        }
    }
}
