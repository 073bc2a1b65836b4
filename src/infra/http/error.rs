use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crudgate_api_types::ObjectsEnvelope;
use serde_json::Value as JsonValue;

use crate::application::error::ErrorReport;
use crate::application::reads::ReadError;
use crate::application::repos::RepoError;

const SOURCE: &str = "infra::http::error";

/// Error response rendered as a failure envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    report: ErrorReport,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ReadError> for ApiError {
    fn from(error: ReadError) -> Self {
        let status = status_for(&error);
        let message = if status.is_server_error() {
            public_server_message(status).to_string()
        } else {
            error.to_string()
        };
        let report = ErrorReport::from_error(SOURCE, status, &error);
        Self {
            status,
            message,
            report,
        }
    }
}

fn status_for(error: &ReadError) -> StatusCode {
    match error {
        ReadError::Filter(_) => StatusCode::BAD_REQUEST,
        ReadError::UnknownTable(_) | ReadError::NotFound { .. } => StatusCode::NOT_FOUND,
        ReadError::Storage(RepoError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
        ReadError::Storage(RepoError::Timeout) => StatusCode::SERVICE_UNAVAILABLE,
        ReadError::Storage(_) | ReadError::DuplicatePrimaryKey { .. } | ReadError::Serialize(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn public_server_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::SERVICE_UNAVAILABLE => "database timeout",
        _ => "internal server error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ObjectsEnvelope<JsonValue> =
            ObjectsEnvelope::failure(self.status.as_u16(), self.message);
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::query::{FilterError, FilterProblem};

    #[test]
    fn filter_errors_are_bad_requests_with_every_problem() {
        let error = FilterError::from_problems(vec![
            FilterProblem::UnrecognizedParameter("bogus__eq=x".to_string()),
            FilterProblem::UnparseableValue("age__gte=a\"b".to_string()),
        ])
        .expect("problems present");
        let api = ApiError::from(ReadError::Filter(error));
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            api.message(),
            "unrecognized params bogus__eq=x; unparseable params age__gte=a\"b"
        );
    }

    #[test]
    fn storage_details_stay_out_of_the_body() {
        let api = ApiError::from(ReadError::Storage(RepoError::from_persistence(
            "password authentication failed",
        )));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message(), "internal server error");
    }

    #[test]
    fn timeouts_are_service_unavailable() {
        let api = ApiError::from(ReadError::Storage(RepoError::Timeout));
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unknown_tables_are_not_found() {
        let api = ApiError::from(ReadError::UnknownTable("widgets".to_string()));
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
        assert_eq!(api.message(), "unknown table `widgets`");
    }
}
