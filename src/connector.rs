//! Store Connector
//!
//! Owns the one store connection of a gateway instance and tracks its state.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::config::StoreConfig;
use crate::error::{GatewayError, Result, StoreError};
use crate::store::{RedisStore, Store};

/// Lifecycle of the store connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

struct Inner {
    state: ConnectionState,
    client: Option<Arc<dyn Store>>,
}

/// Holder of the store connection.
///
/// Built once at startup and shared by reference with everything that needs
/// the store.
pub struct StoreConnector {
    config: StoreConfig,
    inner: RwLock<Inner>,
}

impl StoreConnector {
    /// Creates a disconnected connector.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner {
                state: ConnectionState::Disconnected,
                client: None,
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn service_name(&self) -> &str {
        &self.config.service_name
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.read().state
    }

    /// Connects to the configured Redis server.
    ///
    /// `on_connected` runs once the connection is up. Calling this on a
    /// connector that is connecting or connected does nothing.
    pub async fn init<F>(&self, on_connected: F) -> Result<()>
    where
        F: FnOnce(&StoreConnector),
    {
        if !self.begin_connecting() {
            return Ok(());
        }

        match RedisStore::connect(&self.config).await {
            Ok(store) => {
                info!(
                    service = %self.config.service_name,
                    "Connected to store at {}:{}",
                    self.config.host,
                    self.config.port
                );
                self.finish_connecting(Arc::new(store));
                on_connected(self);
                Ok(())
            }
            Err(err) => {
                self.inner.write().state = ConnectionState::Disconnected;
                Err(self.escalate(err))
            }
        }
    }

    /// Takes an already open store instead of connecting.
    pub fn attach<F>(&self, store: Arc<dyn Store>, on_connected: F)
    where
        F: FnOnce(&StoreConnector),
    {
        if !self.begin_connecting() {
            return;
        }
        self.finish_connecting(store);
        on_connected(self);
    }

    fn begin_connecting(&self) -> bool {
        let mut inner = self.inner.write();
        match inner.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                warn!(
                    service = %self.config.service_name,
                    "Store connection already {}, ignoring init",
                    inner.state
                );
                false
            }
            ConnectionState::Disconnected | ConnectionState::Closed => {
                inner.state = ConnectionState::Connecting;
                true
            }
        }
    }

    fn finish_connecting(&self, store: Arc<dyn Store>) {
        let mut inner = self.inner.write();
        inner.client = Some(store);
        inner.state = ConnectionState::Connected;
    }

    /// The live store handle, if connected.
    pub fn client(&self) -> Option<Arc<dyn Store>> {
        let inner = self.inner.read();
        match inner.state {
            ConnectionState::Connected => inner.client.clone(),
            _ => None,
        }
    }

    /// The live store handle, or a connection error.
    pub fn require_client(&self) -> Result<Arc<dyn Store>> {
        self.client().ok_or_else(|| GatewayError::Connection {
            service: self.config.service_name.clone(),
            message: "store is not connected".to_string(),
        })
    }

    /// Closes the connection if there is one.
    pub async fn uninit(&self) {
        let client = {
            let mut inner = self.inner.write();
            let client = inner.client.take();
            if client.is_some() {
                inner.state = ConnectionState::Closed;
            }
            client
        };

        if let Some(client) = client {
            client.quit().await;
            info!(service = %self.config.service_name, "Store connection closed");
        }
    }

    /// Logs a store error and converts it for the caller.
    pub fn escalate(&self, err: StoreError) -> GatewayError {
        error!(service = %self.config.service_name, "{}", err);
        GatewayError::from_store(&self.config.service_name, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new_connector_has_no_client() {
        let connector = StoreConnector::new(StoreConfig::default());
        assert_eq!(connector.state(), ConnectionState::Disconnected);
        assert!(connector.client().is_none());
        assert!(matches!(
            connector.require_client(),
            Err(GatewayError::Connection { .. })
        ));
    }

    #[test]
    fn test_attach_runs_callback_once() {
        let connector = StoreConnector::new(StoreConfig::default());
        let calls = AtomicUsize::new(0);

        connector.attach(Arc::new(MemoryStore::new()), |c| {
            assert_eq!(c.state(), ConnectionState::Connected);
            calls.fetch_add(1, Ordering::SeqCst);
        });
        connector.attach(Arc::new(MemoryStore::new()), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(connector.client().is_some());
    }

    #[tokio::test]
    async fn test_uninit_is_idempotent() {
        let connector = StoreConnector::new(StoreConfig::default());
        connector.uninit().await;
        assert_eq!(connector.state(), ConnectionState::Disconnected);

        let store = Arc::new(MemoryStore::new());
        connector.attach(store.clone(), |_| {});
        connector.uninit().await;
        connector.uninit().await;

        assert_eq!(connector.state(), ConnectionState::Closed);
        assert!(connector.client().is_none());
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_init_failure_leaves_connector_disconnected() {
        let config = StoreConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..StoreConfig::default()
        };
        let connector = StoreConnector::new(config);
        let mut called = false;

        let result = connector.init(|_| called = true).await;

        assert!(matches!(result, Err(GatewayError::Connection { .. })));
        assert!(!called);
        assert_eq!(connector.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_escalate_prefixes_service() {
        let config = StoreConfig {
            service_name: "sessions".to_string(),
            ..StoreConfig::default()
        };
        let connector = StoreConnector::new(config);
        let err = connector.escalate(StoreError::Command("ERR nope".into()));
        assert_eq!(err.to_string(), "[sessions] ERR nope");
    }
}
