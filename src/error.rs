//! Error types for the gateway
//!
//! Two layers: `StoreError` is what a store driver reports, `GatewayError`
//! is what operations hand back to the request layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Store Error Enum ==
/// Error reported by a store driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The connection failed, dropped or timed out
    #[error("connection error: {0}")]
    Connection(String),

    /// The store rejected the command
    #[error("{0}")]
    Command(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
            || err.is_timeout()
        {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}

/// Result type returned by `Store` implementations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Gateway Error Enum ==
/// Unified error type for gateway operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// A required request field is missing or has the wrong shape
    #[error("Params is wrong: {0}")]
    InvalidParams(String),

    /// The store reported an error for a command
    #[error("[{service}] {message}")]
    Store { service: String, message: String },

    /// The store connection is down or was never established
    #[error("[{service}] {message}")]
    Connection { service: String, message: String },
}

impl GatewayError {
    /// Builds an `InvalidParams` error.
    pub fn invalid(message: impl Into<String>) -> Self {
        GatewayError::InvalidParams(message.into())
    }

    /// Wraps a driver error with the service name.
    pub fn from_store(service: &str, err: StoreError) -> Self {
        match err {
            StoreError::Connection(message) => GatewayError::Connection {
                service: service.to_string(),
                message,
            },
            StoreError::Command(message) => GatewayError::Store {
                service: service.to_string(),
                message,
            },
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::InvalidParams(_) => StatusCode::BAD_REQUEST,
            GatewayError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
