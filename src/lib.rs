//! KV Gateway - key-value operations over a remote Redis-compatible store
//!
//! Provides list/get/set/increment, wildcard delete and raw command
//! passthrough as HTTP handlers, plus a never-failing internal command path.

pub mod api;
pub mod config;
pub mod connector;
pub mod error;
pub mod models;
pub mod ops;
pub mod proxy;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::{Config, StoreConfig};
pub use connector::{ConnectionState, StoreConnector};
pub use error::{GatewayError, StoreError};
pub use models::{KvRequest, OperationResult};
pub use ops::{OperationSet, WildcardDeleteCoordinator};
pub use proxy::{CommandInvocation, CommandProxy, FailurePolicy};
pub use store::{MemoryStore, RedisStore, Store};
pub use tasks::spawn_heartbeat_task;
