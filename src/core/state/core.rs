// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared relay-wide state.

use super::conversation::ConversationLog;
use super::registry::{ClientId, ClientRegistry};
use super::stats::RelayStats;
use crate::config::Config;
use crate::core::protocol::ChunkCodec;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// The central struct holding all shared, relay-wide state.
///
/// It is wrapped in an `Arc` and handed to the acceptor, every connection worker and
/// the backup task. The registry and the conversation log each carry their own lock;
/// the two are never held at the same time.
#[derive(Debug)]
pub struct ServerState {
    /// The configuration the relay was started with.
    pub config: Config,
    /// Who is online.
    pub registry: ClientRegistry,
    /// Event lines waiting for the next backup flush.
    pub conversation: ConversationLog,
    pub stats: RelayStats,
    /// Set once shutdown has begun.
    is_stopping: AtomicBool,
    next_client_id: AtomicU64,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: ClientRegistry::new(),
            conversation: ConversationLog::new(),
            stats: RelayStats::new(),
            is_stopping: AtomicBool::new(false),
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Allocates the identity of a newly accepted connection.
    pub fn next_client_id(&self) -> ClientId {
        ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed))
    }

    /// The codec every connection uses, sized from the configuration.
    pub fn codec(&self) -> ChunkCodec {
        ChunkCodec::new(self.config.max_message_bytes)
    }

    pub fn begin_stopping(&self) {
        self.is_stopping.store(true, Ordering::SeqCst);
    }

    pub fn is_stopping(&self) -> bool {
        self.is_stopping.load(Ordering::SeqCst)
    }
}
