//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while loading or resolving namespace configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown namespace: '{0}'")]
    UnknownNamespace(String),
    #[error("orphaned namespace '{namespace}': parent id {parent_id} not loaded")]
    OrphanedNamespace { namespace: String, parent_id: i64 },
    #[error("duplicate namespace: '{0}'")]
    DuplicateNamespace(String),
    #[error("namespace '{0}': id column name must not be empty")]
    MissingIdColumn(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("reload already in progress")]
    ReloadInProgress,
}

/// Errors raised by the data-access operations.
#[derive(Error, Debug)]
pub enum DataError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("validation: {0}")]
    Validation(String),
    #[error("access denied: {0}")]
    Forbidden(String),
    #[error("unsupported pagination dialect: {0}")]
    Dialect(crate::executor::Dialect),
    #[error("statement execution failed")]
    Execution(#[from] sqlx::Error),
    #[error("clock moved backwards by {behind_ms} ms")]
    ClockRegression { behind_ms: i64 },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for DataError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            DataError::Config(ConfigError::UnknownNamespace(_)) => {
                (StatusCode::NOT_FOUND, "unknown_namespace")
            }
            DataError::Config(ConfigError::ReloadInProgress) => {
                (StatusCode::CONFLICT, "reload_in_progress")
            }
            DataError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            DataError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            DataError::Forbidden(_) => (StatusCode::FORBIDDEN, "access_denied"),
            DataError::Dialect(_) => (StatusCode::INTERNAL_SERVER_ERROR, "dialect_error"),
            DataError::Execution(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    // Cause stays on the source chain and in logs; the outward
                    // body never carries statement text.
                    tracing::error!(error = %e, "statement execution failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            DataError::ClockRegression { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "clock_regression")
            }
            DataError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DataError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
