//! API Module
//!
//! HTTP handlers and routing for the gateway.
//!
//! # Endpoints
//! - `GET /health` - Store health, always available
//! - `GET /keys` - List keys by pattern
//! - `GET /value` - Read a key
//! - `PUT /value` - Write a key with optional expiry
//! - `DELETE /value` - Delete keys, wildcards allowed
//! - `PUT /incr` - Atomic increment
//! - `POST /command` - Raw command passthrough
//!
//! All but `/health` are mounted only when the API is enabled.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{api_router, create_router};
