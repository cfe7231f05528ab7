// In-process key-value store with per-key expiry
// Author: kelexine (https://github.com/kelexine)

use super::KeyValueStore;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Map size that triggers the first sweep of expired entries.
const SWEEP_THRESHOLD: usize = 1024;

/// Memory-backed [`KeyValueStore`].
///
/// Clones share the same map. `set_available(false)` makes every call fail
/// with [`StoreError::Unavailable`], which is how tests simulate an outage.
///
/// Expired entries are dropped on read and swept on write once the map
/// reaches a high-water mark, so keys that are never read again (old rate
/// windows) do not accumulate.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    available: Arc<AtomicBool>,
    sweep_at: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
            sweep_at: Arc::new(AtomicUsize::new(SWEEP_THRESHOLD)),
        }
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        self.sweep(&mut entries)
    }

    fn sweep(&self, entries: &mut HashMap<String, Entry>) -> usize {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        // Next sweep once the live set has doubled
        self.sweep_at
            .store((entries.len() * 2).max(SWEEP_THRESHOLD), Ordering::Relaxed);
        before - entries.len()
    }

    fn insert(&self, entries: &mut HashMap<String, Entry>, key: &str, entry: Entry) {
        entries.insert(key.to_string(), entry);
        if entries.len() >= self.sweep_at.load(Ordering::Relaxed) {
            let removed = self.sweep(entries);
            if removed > 0 {
                debug!("Swept {} expired entries from memory store", removed);
            }
        }
    }

    /// Toggle simulated reachability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether a live value exists under `key`, regardless of availability.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .map(|e| e.is_live(now))
            .unwrap_or(false)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store marked unavailable".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl_seconds: u64) -> StoreResult<()> {
        self.check_available()?;
        let entry = Entry {
            value: value.to_vec(),
            expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
        };
        let mut entries = self.entries.lock();
        self.insert(&mut entries, key, entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.check_available()?;
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }

    async fn increment(&self, key: &str, ttl_seconds: u64) -> StoreResult<i64> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let current = entries
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| std::str::from_utf8(&e.value).ok()?.parse::<i64>().ok())
            .unwrap_or(0);
        let next = current + 1;
        let expires_at = entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at)
            .unwrap_or_else(|| now + Duration::from_secs(ttl_seconds));
        self.insert(
            &mut entries,
            key,
            Entry {
                value: next.to_string().into_bytes(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn info(&self) -> StoreResult<BTreeMap<String, String>> {
        self.check_available()?;
        let mut info = BTreeMap::new();
        info.insert("backend".to_string(), "memory".to_string());
        info.insert("keys".to_string(), self.len().to_string());
        Ok(info)
    }
}
