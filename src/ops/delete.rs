//! Wildcard delete
//!
//! Resolves key patterns to keys, deletes them and totals how many the store
//! actually removed. Several patterns run concurrently, bounded by a
//! semaphore, and the total is only reported once every pattern finished.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::connector::StoreConnector;
use crate::error::{GatewayError, Result, StoreError, StoreResult};
use crate::store::Store;

/// Marker that makes a pattern resolve through `KEYS`.
pub const WILDCARD: char = '*';

pub fn is_wildcard(pattern: &str) -> bool {
    pattern.contains(WILDCARD)
}

/// Deletes everything one pattern names and returns the removed count.
///
/// Literal keys go straight to `DEL`. Wildcards are listed first, and an
/// empty listing issues no delete.
pub async fn delete_pattern(store: &dyn Store, pattern: &str) -> StoreResult<u64> {
    if !is_wildcard(pattern) {
        return store.del(&[pattern.to_string()]).await;
    }

    let keys = store.keys(pattern).await?;
    if keys.is_empty() {
        return Ok(0);
    }
    let removed = store.del(&keys).await?;
    debug!(pattern, matched = keys.len(), removed, "wildcard delete");
    Ok(removed)
}

/// Runs pattern deletes against the connector's store.
#[derive(Clone)]
pub struct WildcardDeleteCoordinator {
    connector: Arc<StoreConnector>,
    concurrency: usize,
}

impl WildcardDeleteCoordinator {
    pub fn new(connector: Arc<StoreConnector>) -> Self {
        let concurrency = connector.config().delete_concurrency.max(1);
        Self {
            connector,
            concurrency,
        }
    }

    /// Deletes all `patterns` and returns the total removed.
    ///
    /// The first store error stops the remaining patterns and is returned;
    /// no partial total is reported.
    pub async fn delete(&self, patterns: Vec<String>) -> Result<u64> {
        let store = self.connector.require_client()?;

        match patterns.as_slice() {
            [] => Ok(0),
            [pattern] => delete_pattern(store.as_ref(), pattern)
                .await
                .map_err(|err| self.connector.escalate(err)),
            _ => self.fan_out(store, patterns).await,
        }
    }

    async fn fan_out(&self, store: Arc<dyn Store>, patterns: Vec<String>) -> Result<u64> {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for pattern in patterns {
            let store = store.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| StoreError::Connection(e.to_string()))?;
                delete_pattern(store.as_ref(), &pattern).await
            });
        }

        // Only this task touches the total, after each join
        let mut total: u64 = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(removed)) => total += removed,
                Ok(Err(err)) => {
                    tasks.abort_all();
                    return Err(self.connector.escalate(err));
                }
                Err(join_err) => {
                    tasks.abort_all();
                    error!(service = %self.connector.service_name(), "delete task failed: {}", join_err);
                    return Err(GatewayError::Store {
                        service: self.connector.service_name().to_string(),
                        message: format!("delete task failed: {}", join_err),
                    });
                }
            }
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::Value as JsonValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Wraps a store, delaying each delete and recording peak concurrency.
    struct SlowStore {
        inner: Arc<MemoryStore>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SlowStore {
        fn new(inner: Arc<MemoryStore>) -> Self {
            Self {
                inner,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Store for SlowStore {
        async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
            self.inner.keys(pattern).await
        }
        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            self.inner.set(key, value).await
        }
        async fn set_ex(&self, key: &str, seconds: u64, value: &str) -> StoreResult<()> {
            self.inner.set_ex(key, seconds, value).await
        }
        async fn del(&self, keys: &[String]) -> StoreResult<u64> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.del(keys).await
        }
        async fn incr_by(&self, key: &str, by: i64) -> StoreResult<i64> {
            self.inner.incr_by(key, by).await
        }
        async fn command(&self, name: &str, args: &[String]) -> StoreResult<JsonValue> {
            self.inner.command(name, args).await
        }
        async fn quit(&self) {}
    }

    async fn seeded(keys: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for key in keys {
            store.set(key, "x").await.unwrap();
        }
        store
    }

    fn coordinator_for(store: Arc<dyn Store>, concurrency: usize) -> WildcardDeleteCoordinator {
        let config = StoreConfig {
            delete_concurrency: concurrency,
            ..StoreConfig::default()
        };
        let connector = Arc::new(StoreConnector::new(config));
        connector.attach(store, |_| {});
        WildcardDeleteCoordinator::new(connector)
    }

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_literal_delete_counts_existing_key() {
        let store = seeded(&["a"]).await;
        let coordinator = coordinator_for(store.clone(), 4);

        assert_eq!(coordinator.delete(patterns(&["a"])).await.unwrap(), 1);
        assert_eq!(coordinator.delete(patterns(&["a"])).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wildcard_delete_removes_matches_only() {
        let store = seeded(&["session:1", "session:2", "other"]).await;
        let coordinator = coordinator_for(store.clone(), 4);

        let affected = coordinator.delete(patterns(&["session:*"])).await.unwrap();

        assert_eq!(affected, 2);
        assert!(store.contains("other"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_wildcard_issues_no_delete() {
        let store = seeded(&["other"]).await;
        let coordinator = coordinator_for(store.clone(), 4);
        let before = store.calls();

        assert_eq!(coordinator.delete(patterns(&["nothing:*"])).await.unwrap(), 0);
        // KEYS only
        assert_eq!(store.calls(), before + 1);
    }

    #[tokio::test]
    async fn test_multiple_patterns_are_summed() {
        let store = seeded(&["a:1", "a:2", "b:1", "c"]).await;
        let coordinator = coordinator_for(store.clone(), 4);

        let affected = coordinator
            .delete(patterns(&["a:*", "b:*", "c", "missing"]))
            .await
            .unwrap();

        assert_eq!(affected, 4);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_pattern_list_touches_nothing() {
        let store = seeded(&["a"]).await;
        let coordinator = coordinator_for(store.clone(), 4);
        let before = store.calls();

        assert_eq!(coordinator.delete(Vec::new()).await.unwrap(), 0);
        assert_eq!(store.calls(), before);
    }

    #[tokio::test]
    async fn test_store_error_aborts_with_prefixed_error() {
        let store = seeded(&["a", "b"]).await;
        let coordinator = coordinator_for(store.clone(), 1);
        store.fail_next(1);

        let err = coordinator.delete(patterns(&["a", "b"])).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::Store {
                service: "redis".to_string(),
                message: "ERR injected failure".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_fan_out_respects_concurrency_bound() {
        let inner = seeded(&["k1", "k2", "k3", "k4", "k5", "k6"]).await;
        let slow = Arc::new(SlowStore::new(inner.clone()));
        let coordinator = coordinator_for(slow.clone(), 2);

        let affected = coordinator
            .delete(patterns(&["k1", "k2", "k3", "k4", "k5", "k6"]))
            .await
            .unwrap();

        assert_eq!(affected, 6);
        assert!(slow.peak.load(Ordering::SeqCst) <= 2);
        assert!(inner.is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_store_is_rejected() {
        let connector = Arc::new(StoreConnector::new(StoreConfig::default()));
        let coordinator = WildcardDeleteCoordinator::new(connector);

        assert!(matches!(
            coordinator.delete(patterns(&["a"])).await,
            Err(GatewayError::Connection { .. })
        ));
    }
}
