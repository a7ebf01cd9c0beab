// src/core/state/stats.rs

//! Counters describing relay activity since startup.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RelayStats {
    /// Connections accepted by the listener.
    total_connections: AtomicU64,
    /// Connections dropped before or during the name handshake.
    failed_handshakes: AtomicU64,
    /// Chat messages fanned out to peers.
    messages_relayed: AtomicU64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn increment_failed_handshakes(&self) {
        self.failed_handshakes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_failed_handshakes(&self) -> u64 {
        self.failed_handshakes.load(Ordering::Relaxed)
    }

    pub fn increment_messages_relayed(&self) {
        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_messages_relayed(&self) -> u64 {
        self.messages_relayed.load(Ordering::Relaxed)
    }
}
