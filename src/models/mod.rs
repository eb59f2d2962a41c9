//! Request and Response models for the gateway API
//!
//! This module defines the DTOs (Data Transfer Objects) exchanged between the
//! HTTP layer and the key-value operations.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{parse_digits, KvRequest};
pub use responses::{ErrorResponse, HealthResponse, OperationResult};
