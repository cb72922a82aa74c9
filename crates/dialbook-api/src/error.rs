//! Dialbook API — error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dialbook_core::error::{DomainError, ValidationIssue};
use dialbook_event_store::pools::PoolError;
use dialbook_projections::error::ProjectionError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors of the two binaries.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A connection pool could not be acquired.
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    /// A projection pipeline failed to start.
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// A projection pipeline stopped on its own.
    #[error("pipeline {0} halted")]
    PipelineHalted(&'static str),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Individual violations of a validation error.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationIssue>,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::Domain(inner) => Self(inner),
            other => Self(DomainError::Infrastructure(other.to_string())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            DomainError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "validation_error",
                    message: err.message,
                    errors: err.errors,
                },
            ),
            DomainError::ResourceNotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "resource_not_found",
                    message,
                    errors: Vec::new(),
                },
            ),
            err @ DomainError::ConcurrencyConflict { .. } => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "concurrency_conflict",
                    message: err.to_string(),
                    errors: Vec::new(),
                },
            ),
            err => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "internal_error",
                        message: err.to_string(),
                        errors: Vec::new(),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
