// src/server/spawner.rs

//! Spawns the relay's long-running background tasks.

use super::context::ServerContext;
use crate::core::tasks::BackupTask;
use tracing::info;

/// Spawns all background tasks into the context's JoinSet.
pub fn spawn_all(ctx: &mut ServerContext) {
    let backup_task = BackupTask::new(ctx.state.clone());
    let shutdown_rx_backup = ctx.shutdown_tx.subscribe();
    ctx.background_tasks.spawn(async move {
        backup_task.run(shutdown_rx_backup).await;
        Ok(())
    });

    info!("All background tasks have been spawned.");
}
