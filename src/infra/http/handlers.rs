use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;
use crate::application::query::QueryParams;
use crate::application::reads::ReadOutcome;

use super::error::ApiError;
use super::state::HttpState;

pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

pub async fn list_objects(
    State(state): State<HttpState>,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let params = QueryParams::parse(query.as_deref().unwrap_or_default());
    let outcome = state.reads.list(&table, &params).await?;
    Ok(payload_response(outcome, state.reads.content_type()))
}

pub async fn get_object(
    State(state): State<HttpState>,
    Path((table, primary_key)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let outcome = state.reads.get(&table, &primary_key).await?;
    Ok(payload_response(outcome, state.reads.content_type()))
}

pub async fn health(State(state): State<HttpState>) -> Response {
    match state.reads.ping().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

fn payload_response(outcome: ReadOutcome, content_type: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (CACHE_STATUS_HEADER, outcome.cache.as_str()),
        ],
        outcome.payload,
    )
        .into_response()
}
