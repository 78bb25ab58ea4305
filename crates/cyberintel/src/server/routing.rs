//! Axum router configuration for all endpoints

use axum::{
  middleware,
  routing::{get, post},
  Router,
};

use crate::server::handlers::{logs, query, status};
use crate::server::middleware::request_context_middleware;
use crate::server::state::AppState;

/// Create the main application router over shared state
pub fn create_router(state: AppState) -> Router {
  Router::new()
    .route("/", get(status::root))
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    .route("/api", get(status::api_info))
    .route("/api/schema", get(status::schema))
    // Logs endpoint
    .route("/logs", get(logs::get_logs))
    // Question answering
    .route("/query", post(query::query))
    .layer(middleware::from_fn_with_state(state.clone(), request_context_middleware))
    .with_state(state)
}
