// src/server/mod.rs

use crate::config::Config;
use anyhow::{Result, anyhow};
use std::future::Future;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

mod connection_loop;
mod context;
mod handshake;
mod initialization;
mod shutdown;
mod spawner;
mod stream;

pub use context::ServerContext;
pub use handshake::perform as perform_handshake;
pub use initialization::setup;
pub use stream::ClientWriter;

/// Runs the relay until SIGINT or SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to register SIGINT handler: {}", e))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to register SIGTERM handler: {}", e))?;

    let ctx = setup(config).await?;
    serve(ctx, async move {
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received, initiating graceful shutdown."),
            _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown."),
        }
    })
    .await;
    Ok(())
}

/// Spawns the background tasks and runs the acceptor until `shutdown` resolves, then
/// performs the full shutdown sequence.
pub async fn serve<F>(mut ctx: ServerContext, shutdown: F)
where
    F: Future<Output = ()>,
{
    spawner::spawn_all(&mut ctx);
    connection_loop::run(ctx, shutdown).await;
}
