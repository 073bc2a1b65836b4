#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response},
};
use bytes::Bytes;
use crudgate::application::query::FilterCompiler;
use crudgate::application::reads::ReadService;
use crudgate::application::repos::{RepoError, Row, SelectRequest, StorageRepo};
use crudgate::application::serializer::JsonEnvelopeSerializer;
use crudgate::cache::{
    CacheConfig, CacheError, CacheKey, FailOpenCache, MemoryCacheStore, ResponseCacheStore,
};
use crudgate::domain::catalog;
use crudgate::domain::value::Value;
use crudgate::infra::http::{HttpState, build_router};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Storage double returning canned rows and remembering every request.
#[derive(Default)]
pub struct FakeStorage {
    rows: Vec<Row>,
    failure: Option<fn() -> RepoError>,
    requests: Mutex<Vec<SelectRequest>>,
}

impl FakeStorage {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn failing(failure: fn() -> RepoError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn requests(&self) -> Vec<SelectRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl StorageRepo for FakeStorage {
    async fn select(&self, request: &SelectRequest) -> Result<Vec<Row>, RepoError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(self.rows.clone()),
        }
    }

    async fn ping(&self) -> Result<(), RepoError> {
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

/// Cache store whose every operation fails.
pub struct BrokenCache;

#[async_trait]
impl ResponseCacheStore for BrokenCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: CacheKey, _payload: Bytes) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

pub fn pump_row(name: &str) -> Row {
    [
        ("id", Value::String("6f1c".to_string())),
        ("name", Value::String(name.to_string())),
        ("deleted_at", Value::Null),
    ]
    .into_iter()
    .collect()
}

pub fn memory_cache() -> Arc<dyn ResponseCacheStore> {
    Arc::new(MemoryCacheStore::new(&CacheConfig::default()))
}

pub fn read_service(storage: Arc<FakeStorage>, cache: Arc<dyn ResponseCacheStore>) -> ReadService {
    ReadService::new(
        Arc::new(catalog::builtin().expect("builtin catalog")),
        FilterCompiler::default(),
        storage,
        FailOpenCache::new(cache),
        Arc::new(JsonEnvelopeSerializer),
    )
}

pub fn router(storage: Arc<FakeStorage>, cache: Arc<dyn ResponseCacheStore>) -> Router {
    build_router(HttpState::new(read_service(storage, cache)))
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body should be json")
}
