//! KV Gateway - HTTP host for the key-value operations
//!
//! Connects to the configured store and serves the gateway routes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kv_gateway::{create_router, spawn_heartbeat_task, AppState, Config, StoreConnector};

/// Main entry point for the gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to the store
/// 4. Start the background heartbeat task
/// 5. Create Axum router, with the key-value routes if enabled
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM stop the heartbeat and close the store connection
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kv_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting KV Gateway");

    let config = Config::from_env();
    info!(
        "Configuration loaded: store={}:{}, service={}, api_enabled={}, port={}, heartbeat={}s",
        config.store.host,
        config.store.port,
        config.store.service_name,
        config.store.enable_api,
        config.server_port,
        config.heartbeat_interval
    );

    let connector = Arc::new(StoreConnector::new(config.store.clone()));
    connector
        .init(|c| info!(service = %c.service_name(), "Store ready"))
        .await
        .context("failed to connect to store")?;

    let state = AppState::new(connector.clone());

    let heartbeat = (config.heartbeat_interval > 0)
        .then(|| spawn_heartbeat_task(state.proxy.clone(), config.heartbeat_interval));

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = heartbeat {
        handle.abort();
        warn!("Heartbeat task aborted");
    }
    connector.uninit().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
