// Cache module: derived analysis cache and per-user list cache
// Author: kelexine (https://github.com/kelexine)

pub mod derived;
pub mod keys;
pub mod lists;
pub mod models;

pub use derived::DerivedCache;
pub use lists::ListCache;
pub use models::{CacheCounters, CacheStats, CachedValue};
