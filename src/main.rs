//! TTL Proxy Cache - caching download proxy server
//!
//! Serves resources from an upstream HTTP origin through a time-bounded
//! read-through cache.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_proxy_cache::{create_router, AppState, CachingProxy, Config, HttpAccessor};

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the caching proxy over the upstream origin
/// 4. Start the background sweeper
/// 5. Serve HTTP until SIGINT/SIGTERM, then stop the sweeper
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_proxy_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TTL Proxy Cache");

    let config = Config::from_env();
    if let Err(err) = config.validate() {
        error!("Refusing to start: {}", err);
        return Err(err).context("invalid configuration");
    }
    info!(
        "Configuration loaded: ttl={:?}, sweep_interval={:?}, max_entries={:?}, single_flight={}, upstream={}, port={}",
        config.cache.ttl,
        config.cache.sweep_interval,
        config.cache.max_entries,
        config.cache.single_flight,
        config.server.upstream_url,
        config.server.port
    );

    let accessor = HttpAccessor::new(config.server.upstream_url.clone());
    let proxy = CachingProxy::new(&config.cache, accessor).context("building caching proxy")?;
    let sweeper = proxy.spawn_sweeper().context("starting sweeper")?;
    info!("Background sweeper started");

    let state = AppState::new(proxy, config.server.fetch_timeout).with_sweeper(sweeper);
    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(sweeper) = &state.sweeper {
        let handle = sweeper.lock().await.stop();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!("Sweeper task ended abnormally: {}", err);
            }
        }
        info!("Background sweeper stopped");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
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
}
