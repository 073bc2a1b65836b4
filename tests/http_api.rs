mod support;

use std::sync::Arc;

use axum::http::{StatusCode, header};
use crudgate::application::repos::RepoError;
use crudgate::infra::http::CACHE_STATUS_HEADER;
use serde_json::json;
use uuid::Uuid;

use support::{
    BrokenCache, FakeStorage, body_bytes, body_json, get, memory_cache, pump_row, router,
};

#[tokio::test]
async fn list_returns_objects_envelope() {
    let storage = Arc::new(FakeStorage::with_rows(vec![pump_row("pump-1")]));
    let app = router(storage, memory_cache());

    let response = get(&app, "/physical_things?name__eq=pump-1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
        Some(&b"application/json"[..])
    );

    assert_eq!(
        body_json(response).await,
        json!({
            "status": 200,
            "success": true,
            "error": null,
            "objects": [{"id": "6f1c", "name": "pump-1", "deleted_at": null}],
        })
    );
}

#[tokio::test]
async fn second_identical_request_is_a_cache_hit() {
    let storage = Arc::new(FakeStorage::with_rows(vec![pump_row("pump-1")]));
    let app = router(storage.clone(), memory_cache());

    let first = get(&app, "/physical_things?type__eq=pump&limit=10").await;
    assert_eq!(
        first.headers().get(&CACHE_STATUS_HEADER).map(|v| v.as_bytes()),
        Some(&b"miss"[..])
    );
    let first_body = body_bytes(first).await;

    let second = get(&app, "/physical_things?limit=10&type__eq=pump").await;
    assert_eq!(
        second.headers().get(&CACHE_STATUS_HEADER).map(|v| v.as_bytes()),
        Some(&b"hit"[..])
    );
    assert_eq!(body_bytes(second).await, first_body);
    assert_eq!(storage.calls(), 1);
}

#[tokio::test]
async fn cache_outage_still_serves_reads() {
    let storage = Arc::new(FakeStorage::with_rows(vec![pump_row("pump-1")]));
    let app = router(storage.clone(), Arc::new(BrokenCache));

    for _ in 0..2 {
        let response = get(&app, "/physical_things").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(storage.calls(), 2);
}

#[tokio::test]
async fn every_filter_problem_is_reported_at_once() {
    let storage = Arc::new(FakeStorage::with_rows(Vec::new()));
    let app = router(storage.clone(), memory_cache());

    let response = get(
        &app,
        "/physical_things?bogus__eq=x&name__between=1&limit=ten",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["objects"], serde_json::Value::Null);
    let message = body["error"].as_str().expect("error message");
    for fragment in ["bogus__eq=x", "name__between=1", "limit=ten"] {
        assert!(message.contains(fragment), "missing {fragment} in {message}");
    }
    assert_eq!(storage.calls(), 0);
}

#[tokio::test]
async fn unknown_table_is_not_found() {
    let app = router(Arc::new(FakeStorage::default()), memory_cache());

    let response = get(&app, "/no_such_table").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["status"], 404);
}

#[tokio::test]
async fn missing_object_is_not_found() {
    let app = router(Arc::new(FakeStorage::default()), memory_cache());

    let response = get(&app, &format!("/physical_things/{}", Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn single_object_uses_the_same_envelope() {
    let storage = Arc::new(FakeStorage::with_rows(vec![pump_row("pump-1")]));
    let app = router(storage, memory_cache());

    let response = get(&app, &format!("/physical_things/{}", Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["objects"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn storage_timeouts_surface_as_unavailable() {
    let storage = Arc::new(FakeStorage::failing(|| RepoError::Timeout));
    let app = router(storage, memory_cache());

    let response = get(&app, "/physical_things").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error"], "database timeout");
}

#[tokio::test]
async fn storage_failures_do_not_leak_details() {
    let storage = Arc::new(FakeStorage::failing(|| {
        RepoError::from_persistence("relation \"secret\" does not exist")
    }));
    let app = router(storage, memory_cache());

    let response = get(&app, "/physical_things").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "internal server error");
}

#[tokio::test]
async fn health_reports_storage_state() {
    let healthy = router(Arc::new(FakeStorage::default()), memory_cache());
    assert_eq!(get(&healthy, "/health").await.status(), StatusCode::NO_CONTENT);

    let unhealthy = router(
        Arc::new(FakeStorage::failing(|| RepoError::Timeout)),
        memory_cache(),
    );
    assert_eq!(
        get(&unhealthy, "/health").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
