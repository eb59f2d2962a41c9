//! API Handlers
//!
//! HTTP request handlers. The key-value handlers turn query string and body
//! into a `KvRequest` and hand it to the `OperationSet`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde_json::Value;
use tracing::debug;

use crate::connector::StoreConnector;
use crate::error::Result;
use crate::models::{HealthResponse, KvRequest, OperationResult};
use crate::ops::OperationSet;
use crate::proxy::CommandProxy;

/// Application state shared across all handlers.
///
/// `api` is only present when the key-value routes are enabled; the
/// connector and proxy are always available to the host.
#[derive(Clone)]
pub struct AppState {
    /// Owner of the store connection
    pub connector: Arc<StoreConnector>,
    /// Internal command passthrough
    pub proxy: CommandProxy,
    /// Public key-value operations
    pub api: Option<OperationSet>,
}

impl AppState {
    /// Creates the state for `connector`, honouring its `enable_api` flag.
    pub fn new(connector: Arc<StoreConnector>) -> Self {
        let api = connector
            .config()
            .enable_api
            .then(|| OperationSet::new(connector.clone()));
        Self {
            proxy: CommandProxy::new(connector.clone()),
            connector,
            api,
        }
    }
}

/// Builds a `KvRequest`; a body that isn't JSON counts as no body.
pub fn kv_request(query: HashMap<String, String>, body: &[u8]) -> KvRequest {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!("Ignoring malformed request body: {}", err);
                None
            }
        }
    };
    KvRequest::new(query, body)
}

/// Handler for GET /keys
pub async fn list_keys_handler(
    State(ops): State<OperationSet>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<OperationResult>> {
    let req = kv_request(query, &body);
    Ok(Json(ops.list_keys(&req).await?))
}

/// Handler for GET /value
pub async fn get_value_handler(
    State(ops): State<OperationSet>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<OperationResult>> {
    let req = kv_request(query, &body);
    Ok(Json(ops.get_value(&req).await?))
}

/// Handler for PUT /value
pub async fn set_value_handler(
    State(ops): State<OperationSet>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<OperationResult>> {
    let req = kv_request(query, &body);
    Ok(Json(ops.set_value(&req).await?))
}

/// Handler for DELETE /value
pub async fn delete_value_handler(
    State(ops): State<OperationSet>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<OperationResult>> {
    let req = kv_request(query, &body);
    Ok(Json(ops.delete_value(&req).await?))
}

/// Handler for PUT /incr
pub async fn increment_handler(
    State(ops): State<OperationSet>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<OperationResult>> {
    let req = kv_request(query, &body);
    Ok(Json(ops.increment(&req).await?))
}

/// Handler for POST /command
pub async fn command_handler(
    State(ops): State<OperationSet>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<OperationResult>> {
    let req = kv_request(query, &body);
    Ok(Json(ops.raw_command(&req).await?))
}

/// Handler for GET /health
///
/// Pings the store through the silent proxy, so it never fails itself.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let reply = state.proxy.invoke_internal("PING", Vec::new()).await;
    let store_ok = reply != Value::Bool(false);
    Json(HealthResponse::new(store_ok, state.connector.state().to_string()))
}
