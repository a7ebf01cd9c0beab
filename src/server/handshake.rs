// src/server/handshake.rs

//! The join handshake: read the display name, register the client, announce the join
//! and reply with the names already online.

use super::stream::ClientWriter;
use crate::connection::{ConnectionHandler, PeerHandle, broadcast};
use crate::core::RelayError;
use crate::core::protocol::{ChunkCodec, decode_display_name, joined_line, name_list};
use crate::core::state::{ClientId, ServerState};
use bytes::Bytes;
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::debug;

/// Performs the handshake for a freshly accepted connection and returns the worker
/// that will serve it.
///
/// Any failure before registration leaves no trace in the registry. If the reply to the
/// new client cannot be sent, its registration is rolled back.
pub async fn perform<R>(
    state: &Arc<ServerState>,
    id: ClientId,
    addr: SocketAddr,
    mut reader: FramedRead<R, ChunkCodec>,
    writer: impl Into<ClientWriter>,
) -> Result<ConnectionHandler<R>, RelayError>
where
    R: AsyncRead + Unpin,
{
    let first = match reader.next().await {
        Some(Ok(chunk)) => chunk,
        Some(Err(e)) => return Err(e),
        None => {
            return Err(RelayError::HandshakeFailed(
                "connection closed before a display name was sent".to_string(),
            ));
        }
    };
    let name = decode_display_name(&first)?;

    if state.is_stopping() {
        return Err(RelayError::HandshakeFailed(
            "relay is shutting down".to_string(),
        ));
    }

    let (peer, kill_rx) = PeerHandle::new(id, addr, writer, state.codec());
    // Shutdown may drain the registry between the check above and this point.
    let Some(registration) = state.registry.register(name.as_str(), peer.clone()) else {
        peer.close().await;
        return Err(RelayError::HandshakeFailed(
            "relay is shutting down".to_string(),
        ));
    };

    let joined = joined_line(&name);
    state.conversation.record(joined.as_str());
    let notified = broadcast(&registration.recipients, &joined).await;
    debug!(
        "Announced {} to {}/{} peers.",
        name,
        notified,
        registration.recipients.len()
    );

    let reply = name_list(&registration.other_names);
    if let Err(e) = peer.send(Bytes::from(reply)).await {
        state.registry.remove(id);
        peer.close().await;
        return Err(e);
    }

    state.conversation.announce(format!(
        "Client \"{name}\" on address {addr} connected"
    ));

    Ok(ConnectionHandler::new(reader, peer, state.clone(), kill_rx))
}
