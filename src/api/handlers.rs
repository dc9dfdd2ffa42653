//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::metrics;
use crate::repository::{InMemoryTodoRepository, TodoRepository};
use crate::todo::{CreatedResponse, TodoId, TodoPayload};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Todo storage.
    pub repository: Arc<dyn TodoRepository>,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create app state over the given repository.
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self {
            repository,
            metrics: None,
        }
    }

    /// App state over a fresh in-memory repository.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryTodoRepository::new()))
    }

    /// Expose metrics from the given Prometheus handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Query string accepted on `/todo`.
#[derive(Debug, Default, Deserialize)]
pub struct TodoQuery {
    /// Raw `id` parameter.
    pub id: Option<String>,
}

impl TodoQuery {
    /// Parsed `id`. Absent and empty both mean "no id".
    pub fn id(&self) -> Result<Option<TodoId>, ApiError> {
        match self.id.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ApiError::MalformedRequest(format!("invalid todo id `{raw}`"))),
        }
    }

    /// Parsed `id`, which must be present.
    pub fn required_id(&self) -> Result<TodoId, ApiError> {
        self.id()?
            .ok_or_else(|| ApiError::MalformedRequest("id is required".to_string()))
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether storage is reachable.
    pub ready: bool,
    /// Storage backend name.
    pub backend: &'static str,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if storage answers, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.repository.backend_name();

    match state.repository.ping().await {
        Ok(()) => (StatusCode::OK, Json(ReadyResponse { ready: true, backend })),
        Err(e) => {
            warn!(backend, error = %e, "storage not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    ready: false,
                    backend,
                }),
            )
        }
    }
}

/// Prometheus exposition handler.
pub async fn metrics_export(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// `/todo` handler: dispatches on method to a repository operation.
///
/// | Method | Query | Success |
/// |---|---|---|
/// | POST | - | 200 `{"id": N}` |
/// | GET | none | 200 array of todos |
/// | GET | `id=N` | 200 todo |
/// | PUT | - | 200, empty body |
/// | DELETE | `id=N` | 204 |
///
/// Anything else is 405.
pub async fn todo(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<TodoQuery>, QueryRejection>,
    body: Bytes,
) -> Response {
    let _timer = metrics::timer_request(&method);

    let response = match dispatch(&state, &method, query, &body).await {
        Ok(response) => response,
        Err(e) => {
            if matches!(e, ApiError::Storage(_)) {
                metrics::inc_storage_errors();
            } else {
                warn!(method = %method, error = %e, "todo request rejected");
            }
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16());
    response
}

async fn dispatch(
    state: &AppState,
    method: &Method,
    query: Result<Query<TodoQuery>, QueryRejection>,
    body: &[u8],
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::MalformedRequest(e.body_text()))?;

    match *method {
        Method::POST => create_todo(state, body).await,
        Method::GET => match query.id()? {
            Some(id) => get_todo(state, id).await,
            None => list_todos(state).await,
        },
        Method::PUT => update_todo(state, body).await,
        Method::DELETE => delete_todo(state, query.required_id()?).await,
        _ => Err(ApiError::MethodNotAllowed(method.clone())),
    }
}

#[instrument(skip(state, body))]
async fn create_todo(state: &AppState, body: &[u8]) -> Result<Response, ApiError> {
    let payload: TodoPayload = serde_json::from_slice(body)?;
    let todo = state.repository.create(payload.into_new_todo()).await?;

    metrics::inc_todos_created();
    info!(id = todo.id, "todo created");

    Ok(Json(CreatedResponse { id: todo.id }).into_response())
}

async fn list_todos(state: &AppState) -> Result<Response, ApiError> {
    let todos = state.repository.get_all().await?;
    Ok(Json(todos).into_response())
}

async fn get_todo(state: &AppState, id: TodoId) -> Result<Response, ApiError> {
    let todo = state.repository.get_by_id(id).await?;
    Ok(Json(todo).into_response())
}

#[instrument(skip(state, body))]
async fn update_todo(state: &AppState, body: &[u8]) -> Result<Response, ApiError> {
    let payload: TodoPayload = serde_json::from_slice(body)?;
    let todo = payload
        .into_todo()
        .ok_or_else(|| ApiError::MalformedRequest("id is required".to_string()))?;

    state.repository.update(&todo).await?;

    metrics::inc_todos_updated();
    info!(id = todo.id, "todo updated");

    Ok(StatusCode::OK.into_response())
}

#[instrument(skip(state))]
async fn delete_todo(state: &AppState, id: TodoId) -> Result<Response, ApiError> {
    state.repository.delete(id).await?;

    metrics::inc_todos_deleted();
    info!(id, "todo deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}
