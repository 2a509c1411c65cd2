//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each kind
//! is turned into an HTTP response.

use crate::config::ConfigError;
use crate::web::envelope::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reading_tracker_core::ports::PortError;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("{0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migrations failed at startup.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A request body or query string failed validation.
    #[error("{0}")]
    Validation(String),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Port(e) => match e {
                PortError::NotFound(_) => StatusCode::NOT_FOUND,
                PortError::Forbidden(_) => StatusCode::FORBIDDEN,
                PortError::Duplicate(_) => StatusCode::CONFLICT,
                PortError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                PortError::Unauthorized => StatusCode::UNAUTHORIZED,
                PortError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {:?}", self);
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };
        ApiResponse::<()>::failure(status, message).into_response()
    }
}
