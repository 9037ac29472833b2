use anyhow::{Context, Result};
use draw2glb_import::DrawingParser;
use tokio::net::TcpListener;

use crate::config::{ServerConfig, SERVICE_NAME};
use crate::router::build_router;
use crate::state::AppState;
use crate::storage::Storage;

/// Binds, serves until Ctrl-C, then drains in-flight requests.
pub async fn serve(config: ServerConfig, parser: DrawingParser) -> Result<()> {
    let storage = Storage::open(&config.storage_dir)
        .with_context(|| format!("open storage dir {:?}", config.storage_dir))?;
    let ocr = parser.ocr_engine().unwrap_or("none");
    let storage_root = storage.root().to_path_buf();
    let state = AppState::new(storage, parser, &config);
    let app = build_router(state, &config);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;
    tracing::info!(
        service = SERVICE_NAME,
        addr = %listener.local_addr()?,
        storage = %storage_root.display(),
        origins = ?config.allowed_origins,
        auth = config.api_key.is_some(),
        ocr,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
