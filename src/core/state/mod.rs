// src/core/state/mod.rs

//! Defines the central `ServerState` struct and the shared components it owns.

mod conversation;
mod core;
mod registry;
mod stats;

pub use conversation::ConversationLog;
pub use core::ServerState;
pub use registry::{
    BroadcastSnapshot, ClientEntry, ClientId, ClientRegistry, Departure, Registration,
};
pub use stats::RelayStats;
