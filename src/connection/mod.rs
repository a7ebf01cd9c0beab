// src/connection/mod.rs

//! Manages the lifecycle of a single client connection after its handshake: the
//! receive loop, message relaying and departure handling.

mod handler;
mod peer;

pub use handler::{CloseReason, ConnectionHandler};
pub use peer::{PeerHandle, PeerSink, broadcast};
