//! HTTP surface: `GET /{table}`, `GET /{table}/{primary_key}` and `GET /health`.

mod error;
mod handlers;
mod middleware;
mod state;

pub use error::ApiError;
pub use handlers::CACHE_STATUS_HEADER;
pub use middleware::RequestContext;
pub use state::HttpState;

use axum::{Router, middleware as axum_middleware, routing::get};

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/{table}", get(handlers::list_objects))
        .route("/{table}/{primary_key}", get(handlers::get_object))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
