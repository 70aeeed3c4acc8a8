//! Cachemesh - A managed in-memory cache layer with cluster coherence
//!
//! Provides named caches with TTL expiration, LRU eviction, usage
//! statistics and cluster-wide invalidation of coherent caches.

mod api;
mod cache;
mod coherence;
mod config;
mod error;
mod manager;
mod models;
mod tasks;

use std::net::SocketAddr;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use config::{Config, Settings};
use manager::CacheManager;
use tasks::spawn_eviction_task;

/// Main entry point for the cachemesh server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load server configuration and cache settings from the environment
/// 3. Create the cache manager and the coherent object cache
/// 4. Start the background eviction task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cachemesh=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cachemesh server");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, eviction_interval={}s",
        config.server_port, config.eviction_interval
    );

    // Create the cache manager with per-cache settings from the environment
    let manager = CacheManager::new(Settings::from_env());
    let objects = manager
        .create_coherent_cache("objects", None, None)
        .expect("object cache name is unique at startup");
    info!("Cache manager initialized");

    // Start background eviction task
    let eviction_handle = spawn_eviction_task(manager.clone(), config.eviction_interval);
    info!("Background eviction task started");

    // Create router with all endpoints
    let app = create_router(AppState::new(manager.clone(), objects));

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(eviction_handle))
        .await
        .unwrap();

    // Drop all cached data before the process exits
    manager.reset();
    info!("Server shutdown complete");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the eviction task and allows graceful shutdown.
async fn shutdown_signal(eviction_handle: tokio::task::JoinHandle<()>) {
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

    // Abort the eviction task
    eviction_handle.abort();
    warn!("Eviction task aborted");
}
