// src/core/tasks/backup.rs

//! Implements the periodic backup task.
//! On every tick the conversation log is drained into the backup file; when told to
//! stop, the task performs one last flush before returning.

use crate::core::persistence::BackupWriter;
use crate::core::state::ServerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

pub struct BackupTask {
    state: Arc<ServerState>,
    writer: BackupWriter,
    period: Duration,
}

impl BackupTask {
    pub fn new(state: Arc<ServerState>) -> Self {
        let writer = BackupWriter::new(state.config.backup_path.clone());
        let period = state.config.backup_interval;
        Self {
            state,
            writer,
            period,
        }
    }

    /// Runs until the shutdown signal arrives (or its sender is dropped), then performs
    /// the final flush.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "Backup task started. Flushing to {} every {:?}.",
            self.writer.path().display(),
            self.period
        );
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.flush_once().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Backup task received shutdown signal. Performing final flush.");
                    self.flush_once().await;
                    info!("Backup task finished.");
                    return;
                }
            }
        }
    }

    /// One best-effort flush. Failures are logged and swallowed.
    pub async fn flush_once(&self) -> usize {
        match self.writer.flush(&self.state.conversation).await {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    "Backup to {} failed, batch lost: {}",
                    self.writer.path().display(),
                    e
                );
                0
            }
        }
    }
}
