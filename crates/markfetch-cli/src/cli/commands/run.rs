//! `markfetch run` – run the retriever loop until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use markfetch_core::config::RetrieverConfig;
use markfetch_core::link_db::LinkDb;
use markfetch_core::retriever::Retriever;

pub async fn run_worker(db: &LinkDb, cfg: &RetrieverConfig) -> Result<()> {
    let pending = db.pending_tasks().await?;
    tracing::info!(pending, "starting retriever");

    let shutdown = shutdown_signal()?;
    let mut retriever = Retriever::new(cfg.clone(), db.clone(), db.clone())?;
    retriever.run(shutdown).await;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix. The SIGTERM handler is installed
/// before the loop starts.
fn shutdown_signal() -> Result<impl std::future::Future<Output = ()>> {
    #[cfg(unix)]
    let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("install SIGTERM handler")?;

    Ok(async move {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                _ = term.recv() => {},
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        tracing::info!("shutdown signal received");
    })
}
