// src/connection/peer.rs

//! Defines `PeerHandle`, the shareable outbound side of a registered client, and the
//! best-effort fan-out built on it.

use crate::core::RelayError;
use crate::core::protocol::ChunkCodec;
use crate::core::state::ClientId;
use crate::server::ClientWriter;
use bytes::Bytes;
use futures::SinkExt;
use futures::future::join_all;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, broadcast};
use tokio_util::codec::FramedWrite;
use tracing::debug;

pub type PeerSink = FramedWrite<ClientWriter, ChunkCodec>;

/// A cloneable handle to one connected client.
///
/// Clones share the same outbound sink and kill switch. The sink has its own lock, so
/// sending to one peer never holds the registry lock.
#[derive(Clone)]
pub struct PeerHandle {
    id: ClientId,
    addr: SocketAddr,
    sink: Arc<Mutex<PeerSink>>,
    kill_tx: broadcast::Sender<()>,
}

impl fmt::Debug for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerHandle")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .finish()
    }
}

impl PeerHandle {
    /// Creates a handle around a client's outbound half. The returned receiver fires
    /// when the connection is force-closed and belongs to the client's worker.
    pub fn new(
        id: ClientId,
        addr: SocketAddr,
        writer: impl Into<ClientWriter>,
        codec: ChunkCodec,
    ) -> (Self, broadcast::Receiver<()>) {
        let (kill_tx, kill_rx) = broadcast::channel(1);
        let handle = Self {
            id,
            addr,
            sink: Arc::new(Mutex::new(FramedWrite::new(writer.into(), codec))),
            kill_tx,
        };
        (handle, kill_rx)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Writes one payload to the client.
    pub async fn send(&self, payload: Bytes) -> Result<(), RelayError> {
        let mut sink = self.sink.lock().await;
        sink.send(payload).await
    }

    /// Force-closes the connection: wakes the client's worker and shuts down the
    /// outbound half if no send is in flight. Errors are ignored.
    pub async fn close(&self) {
        let _ = self.kill_tx.send(());
        if let Ok(mut sink) = self.sink.try_lock() {
            let _ = sink.get_mut().shutdown().await;
        }
    }
}

/// Sends `line` to every recipient concurrently. Individual failures are logged at
/// debug level and otherwise ignored; failed peers are not evicted here.
///
/// Returns the number of recipients the line was delivered to.
pub async fn broadcast(recipients: &[PeerHandle], line: &str) -> usize {
    if recipients.is_empty() {
        return 0;
    }
    let payload = Bytes::copy_from_slice(line.as_bytes());
    let results = join_all(recipients.iter().map(|peer| {
        let payload = payload.clone();
        async move { (peer, peer.send(payload).await) }
    }))
    .await;

    let mut delivered = 0;
    for (peer, result) in results {
        match result {
            Ok(()) => delivered += 1,
            Err(e) => debug!("Dropping message for {} ({}): {}", peer.id, peer.addr, e),
        }
    }
    delivered
}
