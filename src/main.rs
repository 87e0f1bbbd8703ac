// src/main.rs

use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vanguard_recon::api;
use vanguard_recon::app::AppState;
use vanguard_recon::config::Config;
use vanguard_recon::core::scanner::ScanContext;
use vanguard_recon::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Setup ---
    color_eyre::install()?;
    logging::initialize_logging()?;

    let config = Config::from_env().wrap_err("failed to load configuration")?;
    info!(?config, "Configuration loaded.");

    // Cancelled on Ctrl-C so running batches hand back partial results.
    let shutdown = CancellationToken::new();
    let scanner = ScanContext::new(config.scan.clone())?.with_shutdown(shutdown.clone());
    let router = api::create_router(AppState::new(scanner));

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Vanguard recon API listening.");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; shutting down.");
    }
    info!("Shutdown requested, cancelling in-flight scans.");
    shutdown.cancel();
}
