//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

/// Result of a key-value operation.
///
/// Serializes to a single-field object: `{"keys": [...]}`, `{"value": ...}`
/// or `{"affected": n}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    Keys { keys: Vec<String> },
    Value { value: Value },
    Affected { affected: u64 },
}

impl OperationResult {
    pub fn keys(keys: Vec<String>) -> Self {
        OperationResult::Keys { keys }
    }

    pub fn value(value: impl Into<Value>) -> Self {
        OperationResult::Value {
            value: value.into(),
        }
    }

    pub fn affected(affected: u64) -> Self {
        OperationResult::Affected { affected }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the store answered PING, "degraded" otherwise
    pub status: String,
    /// Connection state of the store
    pub connection: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(store_ok: bool, connection: impl Into<String>) -> Self {
        Self {
            status: if store_ok { "healthy" } else { "degraded" }.to_string(),
            connection: connection.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
