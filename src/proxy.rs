//! Command Proxy
//!
//! Forwards arbitrary commands to the store under one of two error policies.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::error;

use crate::connector::StoreConnector;
use crate::error::Result;

/// What to do when the store rejects a forwarded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log and return the error to the caller
    Loud,
    /// Log and return `false` in place of the reply
    Silent,
}

/// A command name with its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub command: String,
    pub arguments: Vec<String>,
}

impl CommandInvocation {
    pub fn new(command: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            command: command.into(),
            arguments,
        }
    }

    /// Builds an invocation from request JSON, normalizing the arguments.
    pub fn from_json(command: impl Into<String>, arguments: Option<&JsonValue>) -> Self {
        Self::new(command, normalize_arguments(arguments))
    }
}

/// Turns a request `arguments` value into an argument list.
///
/// Missing or null gives no arguments, an array passes through element by
/// element, and any other value becomes a one-element list.
pub fn normalize_arguments(arguments: Option<&JsonValue>) -> Vec<String> {
    match arguments {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(items)) => items.iter().map(argument_text).collect(),
        Some(scalar) => vec![argument_text(scalar)],
    }
}

fn argument_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Passthrough to the store for commands the dedicated operations don't cover.
#[derive(Clone)]
pub struct CommandProxy {
    connector: Arc<StoreConnector>,
}

impl CommandProxy {
    pub fn new(connector: Arc<StoreConnector>) -> Self {
        Self { connector }
    }

    /// Sends `invocation` to the store.
    ///
    /// Under `FailurePolicy::Silent` this never returns an error.
    pub async fn invoke(
        &self,
        invocation: &CommandInvocation,
        policy: FailurePolicy,
    ) -> Result<JsonValue> {
        let outcome = match self.connector.require_client() {
            Ok(client) => client
                .command(&invocation.command, &invocation.arguments)
                .await
                .map_err(|err| self.connector.escalate(err)),
            Err(err) => {
                error!(service = %self.connector.service_name(), "{}", err);
                Err(err)
            }
        };

        match (outcome, policy) {
            (Ok(value), _) => Ok(value),
            (Err(err), FailurePolicy::Loud) => Err(err),
            (Err(_), FailurePolicy::Silent) => Ok(JsonValue::Bool(false)),
        }
    }

    /// Internal entry point for host-triggered commands.
    ///
    /// Failures are logged and reported as `false`.
    pub async fn invoke_internal(&self, command: &str, arguments: Vec<String>) -> JsonValue {
        let invocation = CommandInvocation::new(command, arguments);
        self.invoke(&invocation, FailurePolicy::Silent)
            .await
            .unwrap_or(JsonValue::Bool(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::GatewayError;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn connected_proxy() -> (CommandProxy, Arc<MemoryStore>) {
        let connector = Arc::new(StoreConnector::new(StoreConfig::default()));
        let store = Arc::new(MemoryStore::new());
        connector.attach(store.clone(), |_| {});
        (CommandProxy::new(connector), store)
    }

    #[test]
    fn test_normalize_arguments() {
        assert!(normalize_arguments(None).is_empty());
        assert!(normalize_arguments(Some(&JsonValue::Null)).is_empty());
        assert_eq!(normalize_arguments(Some(&json!("k"))), vec!["k"]);
        assert_eq!(normalize_arguments(Some(&json!(5))), vec!["5"]);
        assert_eq!(
            normalize_arguments(Some(&json!(["k", 10, true]))),
            vec!["k", "10", "true"]
        );
        assert!(normalize_arguments(Some(&json!([]))).is_empty());
    }

    #[tokio::test]
    async fn test_loud_policy_returns_reply() {
        let (proxy, _) = connected_proxy();
        let value = proxy
            .invoke(&CommandInvocation::new("PING", vec![]), FailurePolicy::Loud)
            .await
            .unwrap();
        assert_eq!(value, json!("PONG"));
    }

    #[tokio::test]
    async fn test_loud_policy_surfaces_errors() {
        let (proxy, _) = connected_proxy();
        let err = proxy
            .invoke(&CommandInvocation::new("BOGUS", vec![]), FailurePolicy::Loud)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::Store {
                service: "redis".to_string(),
                message: "ERR unknown command 'BOGUS'".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_silent_policy_returns_false() {
        let (proxy, store) = connected_proxy();
        store.fail_next(1);
        assert_eq!(proxy.invoke_internal("PING", vec![]).await, json!(false));
        assert_eq!(proxy.invoke_internal("PING", vec![]).await, json!("PONG"));
    }

    #[tokio::test]
    async fn test_silent_policy_when_disconnected() {
        let connector = Arc::new(StoreConnector::new(StoreConfig::default()));
        let proxy = CommandProxy::new(connector);
        assert_eq!(proxy.invoke_internal("PING", vec![]).await, json!(false));
    }
}
