// src/server/shutdown.rs

//! The shutdown sequence: stop accepting, flush the backup one last time, then evict and
//! close every live connection.

use super::context::ServerContext;
use futures::future::join_all;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// How long to wait for the backup task's final flush.
const BACKGROUND_TASK_TIMEOUT: Duration = Duration::from_secs(10);

/// Tears the relay down. Every step is best-effort; this always completes.
pub async fn run(ctx: ServerContext, mut client_tasks: JoinSet<()>) {
    let ServerContext {
        state,
        listener,
        shutdown_tx,
        mut background_tasks,
    } = ctx;

    state.begin_stopping();
    drop(listener);
    state.conversation.announce("Server shutting down.");

    if shutdown_tx.send(()).is_err() {
        warn!("No background task was listening for the shutdown signal.");
    }
    if tokio::time::timeout(BACKGROUND_TASK_TIMEOUT, async {
        while let Some(res) = background_tasks.join_next().await {
            if let Err(e) = res {
                error!("Background task ended abnormally during shutdown: {e:?}");
            }
        }
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    }

    let peers = state.registry.drain_all();
    info!("Closing {} live connection(s).", peers.len());
    join_all(peers.iter().map(|peer| peer.close())).await;

    let grace = state.config.shutdown_grace;
    if tokio::time::timeout(grace, async {
        while client_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!(
            "Connection workers still running after {:?}; aborting them.",
            grace
        );
        client_tasks.shutdown().await;
    }

    info!(
        "Relay shutdown complete. Connections: {}, failed handshakes: {}, messages relayed: {}.",
        state.stats.get_total_connections(),
        state.stats.get_failed_handshakes(),
        state.stats.get_messages_relayed()
    );
}
