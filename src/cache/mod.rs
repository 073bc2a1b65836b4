//! Response cache.
//!
//! Successful read payloads are stored under a fingerprint of the effective query and
//! served byte-for-byte to later identical reads. The cache is advisory: entries age
//! out by TTL or LRU eviction and are never invalidated on write.
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 1024
//! ttl_seconds = 60
//! ```

mod config;
mod fail_open;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use fail_open::{
    FailOpenCache, METRIC_CACHE_ERROR_TOTAL, METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_MISS_TOTAL,
};
pub use keys::{CacheKey, KEY_PREFIX, fingerprint};
pub use store::{CacheError, DisabledCacheStore, MemoryCacheStore, ResponseCacheStore};
