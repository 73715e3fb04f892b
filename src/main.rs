//! CRM Cache - In-process response cache
//!
//! Runs the cache maintenance API with a periodic expiry sweep.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crm_cache::{api::create_router, spawn_sweep_task, AppState, CacheStrategy, Config};

/// Main entry point for the cache maintenance server.
///
/// # Startup Sequence
/// 1. Load an optional `.env` file
/// 2. Initialize tracing subscriber for logging
/// 3. Load configuration from environment variables
/// 4. Create the cache service
/// 5. Start background expiry sweep
/// 6. Serve the maintenance API until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crm_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CRM cache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, sweep_interval={}s, development_mode={}, cache_in_development={}, ttl_override={:?}",
        config.server_port,
        config.cleanup_interval,
        config.cache.development_mode,
        config.cache.cache_in_development,
        config.cache.ttl_policy.base_override()
    );
    for strategy in CacheStrategy::ALL {
        info!(
            "Strategy {} TTL: {}s",
            strategy,
            config.cache.ttl_policy.ttl_seconds(strategy)
        );
    }
    if config.cache.bypass_cache() {
        warn!("Development mode: memoized calls bypass the cache (set ENABLE_CACHE_IN_DEV=true to cache)");
    }

    let state = AppState::from_config(&config);

    let sweep_handle = spawn_sweep_task(state.cache.clone(), config.cleanup_interval);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweep task.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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

    sweep_handle.abort();
    warn!("Sweep task aborted");
}
