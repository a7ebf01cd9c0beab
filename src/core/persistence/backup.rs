// src/core/persistence/backup.rs

//! Writes drained conversation-log batches to the backup file.
//!
//! Each non-empty flush replaces the file's content with the batch it drained, so the
//! file only ever holds the lines accumulated between the last two flushes.

use crate::core::RelayError;
use crate::core::state::ConversationLog;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct BackupWriter {
    path: PathBuf,
}

impl BackupWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the backup file (and any missing parent directories), truncating
    /// whatever a previous run left behind.
    pub async fn prepare(&self) -> Result<(), RelayError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
            info!("Created backup directory: {}", parent.display());
        }
        fs::write(&self.path, b"").await?;
        Ok(())
    }

    /// Drains the log and overwrites the backup file with the drained lines, one per
    /// row. Returns the number of lines written; 0 means the log was empty and the file
    /// was left untouched.
    ///
    /// The log is cleared before the write is attempted, so a failed write loses that
    /// batch.
    pub async fn flush(&self, log: &ConversationLog) -> Result<usize, RelayError> {
        let Some(lines) = log.drain() else {
            return Ok(0);
        };
        let count = lines.len();
        fs::write(&self.path, render(&lines)).await?;
        debug!("Wrote {} log lines to {}", count, self.path.display());
        Ok(count)
    }
}

fn render(lines: &[String]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}
