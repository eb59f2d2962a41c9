//! Store Heartbeat Task
//!
//! Background task that periodically pings the store through the silent
//! command proxy, so a dead connection shows up in the logs between requests.

use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::proxy::CommandProxy;

/// Spawns a background task that pings the store every `interval_secs`.
///
/// Failures are logged and never end the task. Returns a JoinHandle so the
/// host can abort it during graceful shutdown.
///
/// # Example
/// ```ignore
/// let heartbeat = spawn_heartbeat_task(state.proxy.clone(), 30);
/// // Later, during shutdown:
/// heartbeat.abort();
/// ```
pub fn spawn_heartbeat_task(proxy: CommandProxy, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting store heartbeat with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match proxy.invoke_internal("PING", Vec::new()).await {
                Value::Bool(false) => warn!("Store heartbeat failed"),
                reply => debug!("Store heartbeat: {}", reply),
            }
        }
    })
}
