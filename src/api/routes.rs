//! API Routes
//!
//! Configures the Axum router. The key-value routes are only merged in when
//! the store config enables the API.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    command_handler, delete_value_handler, get_value_handler, health_handler, increment_handler,
    list_keys_handler, set_value_handler, AppState,
};
use crate::ops::OperationSet;

/// Creates the main router.
///
/// # Endpoints
/// - `GET /health` - Store health, always mounted
/// - everything from [`api_router`] when the API is enabled
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone());

    if let Some(ops) = state.api {
        router = router.merge(api_router(ops));
    }

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// Key-value routes over `ops`.
///
/// # Endpoints
/// - `GET /keys` - List keys matching `key` (default `*`)
/// - `GET /value` - Read a key
/// - `PUT /value` - Write a key, optionally with `ex` seconds
/// - `DELETE /value` - Delete keys by name, wildcard or array of either
/// - `PUT /incr` - Increment a key by `increment` (default 1)
/// - `POST /command` - Forward `command` with `arguments`
pub fn api_router(ops: OperationSet) -> Router {
    Router::new()
        .route("/keys", get(list_keys_handler))
        .route(
            "/value",
            get(get_value_handler)
                .put(set_value_handler)
                .delete(delete_value_handler),
        )
        .route("/incr", put(increment_handler))
        .route("/command", post(command_handler))
        .with_state(ops)
}
