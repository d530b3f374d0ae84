use anyhow::{Context, Result};
use loadcast_service::logging::init_logging;
use loadcast_service::{build_router, AppState, ConfigManager};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let manager = ConfigManager::new().context("failed to load configuration")?;
    let environment = manager.environment();
    let config = manager.into_config();

    init_logging(&config.logging)?;
    info!(
        "Starting loadcast service v{} ({} environment)",
        env!("CARGO_PKG_VERSION"),
        environment.as_str()
    );

    let state = AppState::load(&config.artifacts).map_err(|e| {
        error!("Failed to load artifacts: {}", e);
        e
    })?;

    let app = build_router(state, &config.cors);
    let addr = config.server.bind_addr();
    let listener = bind_listener(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("loadcast service terminated unexpectedly")?;

    info!("Shutdown complete");
    Ok(())
}

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
