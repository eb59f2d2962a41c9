//! Key-value operations
//!
//! Each operation validates its request before touching the store, then
//! translates it into store calls and returns an `OperationResult`.

mod delete;


use std::sync::Arc;

use serde_json::Value;

use crate::connector::StoreConnector;
use crate::error::{GatewayError, Result};
use crate::models::{KvRequest, OperationResult};
use crate::proxy::{CommandInvocation, CommandProxy, FailurePolicy};

pub use delete::{delete_pattern, is_wildcard, WildcardDeleteCoordinator, WILDCARD};

/// Pattern used by ListKeys when the request names none.
pub const DEFAULT_PATTERN: &str = "*";

/// Increment applied when the request gives no usable amount.
pub const DEFAULT_INCREMENT: i64 = 1;

/// Expiry in seconds requested by `ex`, if usable.
///
/// Zero is treated like a missing value.
pub fn expiry_seconds(req: &KvRequest) -> Option<u64> {
    req.digits_field("ex").filter(|secs| *secs > 0)
}

/// Increment amount requested by `increment`, at least 1.
pub fn increment_amount(req: &KvRequest) -> i64 {
    req.digits_field("increment")
        .map(|n| i64::try_from(n).unwrap_or(i64::MAX).max(1))
        .unwrap_or(DEFAULT_INCREMENT)
}

/// Delete patterns named by the request's `key`.
pub fn delete_patterns(req: &KvRequest) -> Result<Vec<String>> {
    match req.key_value() {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(pattern) => Ok(pattern),
                _ => Err(GatewayError::invalid("key array must contain only strings")),
            })
            .collect(),
        Some(_) => Ok(vec![req.key()?]),
        None => Err(GatewayError::invalid("key is required")),
    }
}

/// The public key-value operations.
#[derive(Clone)]
pub struct OperationSet {
    connector: Arc<StoreConnector>,
    proxy: CommandProxy,
    deleter: WildcardDeleteCoordinator,
}

impl OperationSet {
    pub fn new(connector: Arc<StoreConnector>) -> Self {
        Self {
            proxy: CommandProxy::new(connector.clone()),
            deleter: WildcardDeleteCoordinator::new(connector.clone()),
            connector,
        }
    }

    /// Lists keys matching `key`, or all keys.
    pub async fn list_keys(&self, req: &KvRequest) -> Result<OperationResult> {
        let pattern = match req.key_value() {
            Some(_) => req.key()?,
            None => DEFAULT_PATTERN.to_string(),
        };
        let store = self.connector.require_client()?;
        let keys = store
            .keys(&pattern)
            .await
            .map_err(|err| self.connector.escalate(err))?;
        Ok(OperationResult::keys(keys))
    }

    /// Reads one key; an absent key gives a null value.
    pub async fn get_value(&self, req: &KvRequest) -> Result<OperationResult> {
        let key = req.key()?;
        let store = self.connector.require_client()?;
        let value = store
            .get(&key)
            .await
            .map_err(|err| self.connector.escalate(err))?;
        Ok(OperationResult::value(value))
    }

    /// Writes one key, with an expiry when `ex` holds a positive integer.
    pub async fn set_value(&self, req: &KvRequest) -> Result<OperationResult> {
        let key = req.key()?;
        let value = req.value()?;
        let store = self.connector.require_client()?;

        let written = match expiry_seconds(req) {
            Some(seconds) => store.set_ex(&key, seconds, &value).await,
            None => store.set(&key, &value).await,
        };
        written.map_err(|err| self.connector.escalate(err))?;
        Ok(OperationResult::affected(1))
    }

    /// Atomically adds `increment` (default 1) to one key.
    pub async fn increment(&self, req: &KvRequest) -> Result<OperationResult> {
        let key = req.key()?;
        let by = increment_amount(req);
        let store = self.connector.require_client()?;
        let value = store
            .incr_by(&key, by)
            .await
            .map_err(|err| self.connector.escalate(err))?;
        Ok(OperationResult::value(value))
    }

    /// Deletes keys by literal name or wildcard, one pattern or many.
    pub async fn delete_value(&self, req: &KvRequest) -> Result<OperationResult> {
        let patterns = delete_patterns(req)?;
        let affected = self.deleter.delete(patterns).await?;
        Ok(OperationResult::affected(affected))
    }

    /// Forwards `command` with its `arguments`, surfacing store errors.
    pub async fn raw_command(&self, req: &KvRequest) -> Result<OperationResult> {
        let command = match req.body_field("command") {
            Some(Value::String(command)) if !command.is_empty() => command.clone(),
            Some(_) => return Err(GatewayError::invalid("command must be a non-empty string")),
            None => return Err(GatewayError::invalid("command is required")),
        };
        let invocation = CommandInvocation::from_json(command, req.body_field("arguments"));
        let value = self.proxy.invoke(&invocation, FailurePolicy::Loud).await?;
        Ok(OperationResult::value(value))
    }
}
