// src/connection/handler.rs

//! Defines the `ConnectionHandler`, the worker that owns one registered client's
//! receive loop, relays its messages and announces its departure.

use super::peer::{PeerHandle, broadcast};
use crate::core::RelayError;
use crate::core::protocol::{ChunkCodec, chat_line, decode_text, left_line};
use crate::core::state::ServerState;
use futures::StreamExt;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::broadcast as signal;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

/// Why the receive loop ended.
#[derive(Debug)]
pub enum CloseReason {
    /// The peer closed its side (zero-length read).
    PeerClosed,
    /// Reading from the transport failed.
    ReadError(RelayError),
    /// The peer sent bytes that are not text.
    InvalidMessage(RelayError),
    /// The connection was force-closed, e.g. during shutdown.
    Killed,
    /// The client was no longer registered when it tried to send.
    Evicted,
}

/// Manages a registered client from the end of its handshake until it is gone.
pub struct ConnectionHandler<R> {
    reader: FramedRead<R, ChunkCodec>,
    peer: PeerHandle,
    state: Arc<ServerState>,
    kill_rx: signal::Receiver<()>,
}

impl<R> ConnectionHandler<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(
        reader: FramedRead<R, ChunkCodec>,
        peer: PeerHandle,
        state: Arc<ServerState>,
        kill_rx: signal::Receiver<()>,
    ) -> Self {
        Self {
            reader,
            peer,
            state,
            kill_rx,
        }
    }

    /// Runs the receive loop to completion, then tears the connection down.
    pub async fn run(mut self) -> CloseReason {
        let reason = loop {
            tokio::select! {
                biased;
                _ = self.kill_rx.recv() => {
                    debug!("Connection handler for {} received kill signal.", self.peer.id());
                    break CloseReason::Killed;
                }
                result = self.reader.next() => {
                    match result {
                        Some(Ok(chunk)) => {
                            if let Err(reason) = self.relay(&chunk).await {
                                break reason;
                            }
                        }
                        Some(Err(e)) => break CloseReason::ReadError(e),
                        None => break CloseReason::PeerClosed,
                    }
                }
            }
        };
        self.close(&reason).await;
        reason
    }

    /// Relays one inbound chunk to every other registered client.
    async fn relay(&self, chunk: &[u8]) -> Result<(), CloseReason> {
        let text = decode_text(chunk).map_err(CloseReason::InvalidMessage)?;
        let Some(snapshot) = self.state.registry.snapshot_excluding(self.peer.id()) else {
            return Err(CloseReason::Evicted);
        };

        let line = chat_line(&snapshot.sender_name, text);
        self.state.conversation.record(line.as_str());
        let delivered = broadcast(&snapshot.recipients, &line).await;
        self.state.stats.increment_messages_relayed();
        debug!(
            "{} relayed a message to {}/{} peers.",
            self.peer.id(),
            delivered,
            snapshot.recipients.len()
        );
        Ok(())
    }

    /// Removes the client and announces its departure exactly once. If the registry
    /// entry is already gone, someone else has handled the departure and nothing is
    /// announced.
    async fn close(&self, reason: &CloseReason) {
        match reason {
            CloseReason::ReadError(e) if !e.is_normal_disconnect() => {
                warn!("Connection error for {}: {}", self.peer.addr(), e);
            }
            CloseReason::InvalidMessage(e) => {
                warn!(
                    "Disconnecting {} after an undecodable message: {}",
                    self.peer.addr(),
                    e
                );
            }
            _ => {}
        }

        let Some(departure) = self.state.registry.remove(self.peer.id()) else {
            debug!(
                "{} was already removed from the registry; nothing to announce.",
                self.peer.id()
            );
            self.peer.close().await;
            return;
        };

        self.state.conversation.announce(format!(
            "Client \"{}\" with address {} disconnected.",
            departure.name,
            self.peer.addr()
        ));
        let line = left_line(&departure.name);
        self.state.conversation.record(line.as_str());
        broadcast(&departure.recipients, &line).await;
        self.peer.close().await;
    }
}
