//! `vidrelay serve` – run the HTTP relay.

use anyhow::Result;
use vidrelay_core::config::RelayConfig;
use vidrelay_core::server;

pub async fn run_serve(cfg: &RelayConfig) -> Result<()> {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("shutdown requested");
    };
    server::serve(cfg, shutdown).await
}
