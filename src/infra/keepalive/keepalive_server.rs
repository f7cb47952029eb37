// Keep-alive HTTP endpoint.
//
// Uptime monitors ping this to keep free-tier hosts from idling the process.
// It carries no bot state; it only proves the process is up.

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub fn router() -> Router {
    Router::new()
        .route("/", get(alive))
        .route("/health", get(alive))
}

async fn alive() -> &'static str {
    "I'm alive"
}

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn serve(addr: SocketAddr, shutdown: CancellationToken) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, shutdown).await
}

pub async fn serve_on(listener: TcpListener, shutdown: CancellationToken) -> anyhow::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "Keep-alive endpoint listening");
    axum::serve(listener, router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
