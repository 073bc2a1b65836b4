//! Response cache backends.
//!
//! The read path only sees [`ResponseCacheStore`]; which backend sits behind it is
//! decided once at startup from [`CacheConfig`].

use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache `{op}` failed: {message}")]
    Operation { op: &'static str, message: String },
}

impl CacheError {
    pub fn operation(op: &'static str, message: impl Into<String>) -> Self {
        Self::Operation {
            op,
            message: message.into(),
        }
    }
}

/// Byte store keyed by query fingerprint.
///
/// Implementations may lose entries at any time; callers treat the cache as advisory.
#[async_trait]
pub trait ResponseCacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: CacheKey, payload: Bytes) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct Entry {
    payload: Bytes,
    stored_at: Instant,
}

/// In-process LRU with an optional per-entry time to live.
pub struct MemoryCacheStore {
    entries: RwLock<LruCache<CacheKey, Entry>>,
    ttl: Option<Duration>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
            ttl: config.ttl(),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(entry.stored_at) >= ttl)
    }
}

#[async_trait]
impl ResponseCacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");

        let expired = match entries.get(key) {
            Some(entry) if !self.is_expired(entry, now) => {
                return Ok(Some(entry.payload.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: CacheKey, payload: Bytes) -> Result<(), CacheError> {
        let entry = Entry {
            payload,
            stored_at: Instant::now(),
        };
        rw_write(&self.entries, SOURCE, "set").put(key, entry);
        Ok(())
    }
}

/// Backend used when caching is switched off: never hits, never stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCacheStore;

#[async_trait]
impl ResponseCacheStore for DisabledCacheStore {
    async fn get(&self, _key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: CacheKey, _payload: Bytes) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::application::query::{FilterCompiler, QueryParams};
    use crate::cache::keys::fingerprint;
    use crate::domain::columns::{ColumnDescriptor, ColumnRegistry, SemanticType};
    use crate::domain::entities::EntityDefinition;

    fn key(query: &str) -> CacheKey {
        let registry = ColumnRegistry::new([ColumnDescriptor::new("id", SemanticType::Integer)])
            .expect("valid registry");
        let entity = EntityDefinition::new("things", "id", registry).expect("valid entity");
        let compiled = FilterCompiler::default()
            .compile(&entity, &QueryParams::parse(query))
            .expect("compiles");
        fingerprint(&compiled, None)
    }

    fn config(capacity: usize, ttl_seconds: u64) -> CacheConfig {
        CacheConfig {
            enabled: true,
            capacity,
            ttl_seconds,
        }
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryCacheStore::new(&config(8, 0));
        let key = key("id__eq=1");

        assert!(store.get(&key).await.expect("get").is_none());
        store
            .set(key.clone(), Bytes::from_static(b"payload"))
            .await
            .expect("set");
        assert_eq!(
            store.get(&key).await.expect("get"),
            Some(Bytes::from_static(b"payload"))
        );
    }

    #[tokio::test]
    async fn memory_store_evicts_least_recently_used() {
        let store = MemoryCacheStore::new(&config(2, 0));
        let (first, second, third) = (key("id__eq=1"), key("id__eq=2"), key("id__eq=3"));

        store.set(first.clone(), Bytes::from_static(b"1")).await.expect("set");
        store.set(second.clone(), Bytes::from_static(b"2")).await.expect("set");
        store.set(third.clone(), Bytes::from_static(b"3")).await.expect("set");

        assert!(store.get(&first).await.expect("get").is_none());
        assert!(store.get(&second).await.expect("get").is_some());
        assert!(store.get(&third).await.expect("get").is_some());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_dropped() {
        let store = MemoryCacheStore {
            entries: RwLock::new(LruCache::new(config(4, 0).capacity_non_zero())),
            ttl: Some(Duration::from_millis(10)),
        };
        let key = key("id__eq=1");

        store.set(key.clone(), Bytes::from_static(b"stale")).await.expect("set");
        tokio::time::sleep(Duration::from_millis(25)).await;

        assert!(store.get(&key).await.expect("get").is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn disabled_store_never_hits() {
        let store = DisabledCacheStore;
        let key = key("id__eq=1");
        store.set(key.clone(), Bytes::from_static(b"x")).await.expect("set");
        assert!(store.get(&key).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn memory_store_recovers_from_poisoned_lock() {
        let store = MemoryCacheStore::new(&config(4, 0));

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store
                .entries
                .write()
                .expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        let key = key("id__eq=1");
        store.set(key.clone(), Bytes::from_static(b"ok")).await.expect("set");
        assert!(store.get(&key).await.expect("get").is_some());
    }
}
