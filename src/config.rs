//! Configuration Module
//!
//! Handles loading the gateway and store configuration from environment variables.

use std::env;

/// Default Redis port
pub const DEFAULT_STORE_PORT: u16 = 6379;

/// Settings for the store connection and the API surface built on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name used to prefix escalated errors and tag log lines
    pub service_name: String,
    /// Store host
    pub host: String,
    /// Store port
    pub port: u16,
    /// Optional AUTH password, never empty when set
    pub password: Option<String>,
    /// Whether the key-value HTTP operations are mounted
    pub enable_api: bool,
    /// Maximum number of delete patterns processed at once
    pub delete_concurrency: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            service_name: "redis".to_string(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_STORE_PORT,
            password: None,
            enable_api: false,
            delete_concurrency: 16,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Seconds between store heartbeats, 0 disables them
    pub heartbeat_interval: u64,
    /// Store connection settings
    pub store: StoreConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `HEARTBEAT_INTERVAL` - Heartbeat period in seconds (default: 30)
    /// - `SERVICE_NAME` - Error/log prefix (default: redis)
    /// - `REDIS_HOST` - Store host (default: 127.0.0.1)
    /// - `REDIS_PORT` - Store port (default: 6379)
    /// - `REDIS_PASSWORD` - Store password (default: none)
    /// - `REDIS_ENABLE_API` - Mount the key-value routes (default: false)
    /// - `DELETE_CONCURRENCY` - Parallel delete patterns (default: 16)
    pub fn from_env() -> Self {
        let defaults = StoreConfig::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(3000),
            heartbeat_interval: parse_var("HEARTBEAT_INTERVAL").unwrap_or(30),
            store: StoreConfig {
                service_name: env::var("SERVICE_NAME")
                    .ok()
                    .filter(|v| !v.is_empty())
                    .unwrap_or(defaults.service_name),
                host: env::var("REDIS_HOST")
                    .ok()
                    .filter(|v| !v.is_empty())
                    .unwrap_or(defaults.host),
                port: parse_var("REDIS_PORT").unwrap_or(defaults.port),
                password: env::var("REDIS_PASSWORD").ok().filter(|v| !v.is_empty()),
                enable_api: env::var("REDIS_ENABLE_API")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(defaults.enable_api),
                delete_concurrency: parse_var::<usize>("DELETE_CONCURRENCY")
                    .unwrap_or(defaults.delete_concurrency)
                    .max(1),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            heartbeat_interval: 30,
            store: StoreConfig::default(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
