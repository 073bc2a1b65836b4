//! Fail-open wrapper around a [`ResponseCacheStore`].
//!
//! Backend errors never reach the read path: a failed lookup is reported as a miss and
//! a failed write is logged and dropped.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use tracing::{debug, warn};

use super::keys::CacheKey;
use super::store::ResponseCacheStore;

pub const METRIC_CACHE_HIT_TOTAL: &str = "crudgate_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "crudgate_cache_miss_total";
pub const METRIC_CACHE_ERROR_TOTAL: &str = "crudgate_cache_error_total";

#[derive(Clone)]
pub struct FailOpenCache {
    store: Arc<dyn ResponseCacheStore>,
}

impl FailOpenCache {
    pub fn new(store: Arc<dyn ResponseCacheStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        match self.store.get(key).await {
            Ok(Some(payload)) => {
                counter!(METRIC_CACHE_HIT_TOTAL).increment(1);
                debug!(key = %key, bytes = payload.len(), "Response cache hit");
                Some(payload)
            }
            Ok(None) => {
                counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
                None
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "get").increment(1);
                counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
                warn!(
                    key = %key,
                    error = %err,
                    result = "forced_miss",
                    "Response cache read failed"
                );
                None
            }
        }
    }

    pub async fn set(&self, key: CacheKey, payload: Bytes) {
        let key_label = key.to_string();
        if let Err(err) = self.store.set(key, payload).await {
            counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "set").increment(1);
            warn!(
                key = %key_label,
                error = %err,
                result = "dropped",
                "Response cache write failed"
            );
        }
    }
}
