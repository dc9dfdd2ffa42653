//! HTTP API route definitions.

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{health, metrics_export, ready, todo, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics_export))
        // Todo resource, dispatched on method by the handler
        .route("/todo", any(todo))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
