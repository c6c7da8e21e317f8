//! iscc-api - Composite identifier service
//!
//! Accepts media uploads, returns their composite ISCC identifier and
//! persists thumbnails and metadata in the background.

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iscc_api::config::ServiceConfig;
use iscc_api::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iscc_api=info,iscc_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting iscc-api");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::load();
    config
        .bits
        .validate()
        .context("Invalid unit bit configuration")?;

    tokio::fs::create_dir_all(&config.thumbnail_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create thumbnail directory {}",
                config.thumbnail_dir.display()
            )
        })?;

    let state = AppState::from_config(&config).context("Failed to build HTTP clients")?;
    let processor = state.processor.clone();
    let app = iscc_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!("Listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let tasks = processor.tasks();
    tasks.close();
    if !tasks.is_empty() {
        info!(pending = tasks.len(), "Waiting for persistence tasks");
    }
    tasks.wait().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
