// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Body of every error response: `{"error": "..."}`.
#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
}

/// Errors that can occur while serving promotion counters.
///
/// Implements `IntoResponse` so handlers can bubble them up with `?`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed caller input. Rejected before any store call.
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Invalid action")]
    InvalidAction,

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The counter store replied with an error or an unexpected payload.
    #[error("{operation} failed: {message}")]
    Storage { operation: String, message: String },

    #[error("Upstash request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "redis")]
    #[error("Redis pool error: {0}")]
    RedisPool(#[from] deadpool_redis::PoolError),

    #[cfg(feature = "redis")]
    #[error("Redis command error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// True for failures of the backing store (as opposed to bad input).
    pub fn is_backend_unavailable(&self) -> bool {
        match self {
            Self::Storage { .. } | Self::Http(_) => true,
            #[cfg(feature = "redis")]
            Self::RedisPool(_) | Self::Redis(_) => true,
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InvalidAction => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(feature = "redis")]
impl From<deadpool_redis::CreatePoolError> for AppError {
    fn from(e: deadpool_redis::CreatePoolError) -> Self {
        AppError::Config(format!("Failed to create Redis pool: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        } else if let Self::Validation { field, .. } = &self {
            warn!(error = %self, field = %field, status = status.as_u16(), "Request rejected");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
