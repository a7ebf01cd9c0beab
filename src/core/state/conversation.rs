// src/core/state/conversation.rs

//! The conversation log: an append-only, chronological buffer of event lines that the
//! backup task periodically drains.

use parking_lot::Mutex;
use tracing::info;

#[derive(Debug, Default)]
pub struct ConversationLog {
    lines: Mutex<Vec<String>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line without echoing it to the operator console. Used for chat
    /// content and join/leave notices, which clients already see.
    pub fn record(&self, line: impl Into<String>) {
        self.lines.lock().push(line.into());
    }

    /// Appends a line and echoes it to the operator console.
    pub fn announce(&self, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.lines.lock().push(line);
    }

    /// Takes every buffered line, leaving the log empty. Returns `None` if there was
    /// nothing to take.
    pub fn drain(&self) -> Option<Vec<String>> {
        let mut lines = self.lines.lock();
        if lines.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut *lines))
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}
