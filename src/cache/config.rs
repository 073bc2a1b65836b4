//! Response cache configuration.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::store::{DisabledCacheStore, MemoryCacheStore, ResponseCacheStore};

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_TTL_SECONDS: u64 = 60;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve repeated reads from the in-memory store.
    pub enabled: bool,
    /// Maximum cached payloads before LRU eviction.
    pub capacity: usize,
    /// Entry lifetime; `0` keeps entries until evicted.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity,
            ttl_seconds: settings.ttl_seconds,
        }
    }
}

impl CacheConfig {
    /// Capacity as `NonZeroUsize`, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_seconds > 0).then(|| Duration::from_secs(self.ttl_seconds))
    }

    /// Build the backend selected by this configuration.
    pub fn build_store(&self) -> Arc<dyn ResponseCacheStore> {
        if self.enabled {
            Arc::new(MemoryCacheStore::new(self))
        } else {
            Arc::new(DisabledCacheStore)
        }
    }
}
