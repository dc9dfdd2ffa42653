//! Unified error types for the todo service.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::todo::TodoId;

/// Unified error type for service startup and commands.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Database connection error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by a [`TodoRepository`](crate::repository::TodoRepository).
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No record has the requested id.
    #[error("todo {0} not found")]
    NotFound(TodoId),

    /// The storage medium rejected the operation.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    /// Every positive id up to `i64::MAX` has been issued.
    #[error("todo id space exhausted")]
    IdsExhausted,
}

/// Errors surfaced by the `/todo` handler, each mapped to one HTTP status.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body is not a well-formed todo payload.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Missing or unparseable id, in the query string or the body.
    #[error("{0}")]
    MalformedRequest(String),

    /// Target record does not exist.
    #[error("todo {0} not found")]
    NotFound(TodoId),

    /// Method not handled on `/todo`.
    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),

    /// Underlying storage failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) | ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(id) => ApiError::NotFound(id),
            RepositoryError::Storage(e) => ApiError::Storage(e.to_string()),
            RepositoryError::IdsExhausted => {
                ApiError::Storage(RepositoryError::IdsExhausted.to_string())
            }
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human readable message.
    pub error: String,
}

/// Methods accepted on `/todo`, advertised on 405 responses.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Storage(reason) => {
                error!(reason = %reason, "todo storage failure");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (status, Json(ErrorResponse { error: message })).into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_statuses() {
        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        assert_eq!(ApiError::InvalidJson(bad_json).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::MalformedRequest("id is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound(7).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::MethodNotAllowed(Method::PATCH).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::Storage("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn repository_not_found_keeps_id() {
        let err: ApiError = RepositoryError::NotFound(42).into();
        assert!(matches!(err, ApiError::NotFound(42)));
        assert_eq!(err.to_string(), "todo 42 not found");
    }

    #[test]
    fn exhausted_ids_are_a_server_error() {
        let err: ApiError = RepositoryError::IdsExhausted.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn method_not_allowed_sets_allow_header() {
        let response = ApiError::MethodNotAllowed(Method::PATCH).into_response();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], ALLOWED_METHODS);
    }
}
