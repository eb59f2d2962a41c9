//! Store Module
//!
//! The `Store` trait is everything the gateway needs from a key-value store.
//! `RedisStore` talks to a real server, `MemoryStore` keeps data in process.

mod clock;
mod entry;
mod glob;
mod memory;
mod redis_store;

use async_trait::async_trait;

use crate::error::StoreResult;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::StoreEntry;
pub use glob::glob_match;
pub use memory::MemoryStore;
pub use redis_store::{connection_url, reply_to_json, RedisStore};

/// Key-value operations the gateway issues against a store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Keys matching a glob pattern.
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Value at `key`, or None when absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Sets `key` with no expiry, clearing any previous one.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Sets `key` and its expiry in one step.
    async fn set_ex(&self, key: &str, seconds: u64, value: &str) -> StoreResult<()>;

    /// Deletes `keys` and returns how many existed.
    async fn del(&self, keys: &[String]) -> StoreResult<u64>;

    /// Adds `by` to the integer at `key` (0 if absent) and returns the result.
    async fn incr_by(&self, key: &str, by: i64) -> StoreResult<i64>;

    /// Runs an arbitrary command and returns its reply as JSON.
    async fn command(&self, name: &str, args: &[String]) -> StoreResult<serde_json::Value>;

    /// Closes the connection.
    async fn quit(&self);
}
