//! Cache-aside read pipeline shared by every entity.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use metrics::histogram;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::application::query::{CompiledQuery, FilterCompiler, FilterError, QueryParams};
use crate::application::repos::{RepoError, Row, SelectRequest, StorageRepo};
use crate::application::serializer::{ResponseSerializer, SerializeError};
use crate::cache::{CacheKey, FailOpenCache, fingerprint};
use crate::domain::entities::{EntityCatalog, EntityDefinition};

pub const METRIC_STORAGE_SELECT_MS: &str = "crudgate_storage_select_ms";

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("unknown table `{0}`")]
    UnknownTable(String),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("no `{table}` row with primary key `{key}`")]
    NotFound { table: String, key: String },
    #[error("primary key `{key}` matched more than one `{table}` row")]
    DuplicatePrimaryKey { table: String, key: String },
    #[error(transparent)]
    Storage(#[from] RepoError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub payload: Bytes,
    pub cache: CacheOutcome,
}

#[derive(Clone)]
pub struct ReadService {
    catalog: Arc<EntityCatalog>,
    compiler: FilterCompiler,
    storage: Arc<dyn StorageRepo>,
    cache: FailOpenCache,
    serializer: Arc<dyn ResponseSerializer>,
}

impl ReadService {
    pub fn new(
        catalog: Arc<EntityCatalog>,
        compiler: FilterCompiler,
        storage: Arc<dyn StorageRepo>,
        cache: FailOpenCache,
        serializer: Arc<dyn ResponseSerializer>,
    ) -> Self {
        Self {
            catalog,
            compiler,
            storage,
            cache,
            serializer,
        }
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn content_type(&self) -> &'static str {
        self.serializer.content_type()
    }

    /// Filtered list read.
    #[instrument(skip_all, fields(table = %table))]
    pub async fn list(&self, table: &str, params: &QueryParams) -> Result<ReadOutcome, ReadError> {
        let entity = self.entity(table)?;
        let query = self.compiler.compile(&entity, params)?;
        let key = fingerprint(&query, None);

        self.read_through(&entity, query, key, Ok).await
    }

    /// Single-object read by raw primary key. Missing rows are reported, not cached.
    #[instrument(skip_all, fields(table = %table, key = %raw_key))]
    pub async fn get(&self, table: &str, raw_key: &str) -> Result<ReadOutcome, ReadError> {
        let entity = self.entity(table)?;
        let query = self.compiler.primary_key_query(&entity, raw_key);
        let key = fingerprint(&query, Some(raw_key));

        self.read_through(&entity, query, key, |rows| match rows.len() {
            0 => Err(ReadError::NotFound {
                table: table.to_string(),
                key: raw_key.to_string(),
            }),
            1 => Ok(rows),
            _ => Err(ReadError::DuplicatePrimaryKey {
                table: table.to_string(),
                key: raw_key.to_string(),
            }),
        })
        .await
    }

    pub async fn ping(&self) -> Result<(), RepoError> {
        self.storage.ping().await
    }

    fn entity(&self, table: &str) -> Result<Arc<EntityDefinition>, ReadError> {
        self.catalog
            .get(table)
            .ok_or_else(|| ReadError::UnknownTable(table.to_string()))
    }

    async fn read_through(
        &self,
        entity: &EntityDefinition,
        query: CompiledQuery,
        key: CacheKey,
        check: impl FnOnce(Vec<Row>) -> Result<Vec<Row>, ReadError>,
    ) -> Result<ReadOutcome, ReadError> {
        if let Some(payload) = self.cache.get(&key).await {
            return Ok(ReadOutcome {
                payload,
                cache: CacheOutcome::Hit,
            });
        }

        let request = SelectRequest::new(entity, &query);
        let started = Instant::now();
        let selected = self.storage.select(&request).await;
        histogram!(METRIC_STORAGE_SELECT_MS, "table" => entity.table().to_string())
            .record(started.elapsed().as_secs_f64() * 1000.0);
        let rows = check(selected?)?;
        let payload = self.serializer.serialize(&rows)?;

        debug!(
            table = entity.table(),
            rows = rows.len(),
            bytes = payload.len(),
            "Read served from storage"
        );

        self.cache.set(key, payload.clone()).await;
        Ok(ReadOutcome {
            payload,
            cache: CacheOutcome::Miss,
        })
    }
}
