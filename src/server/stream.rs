// src/server/stream.rs

use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncWrite, DuplexStream, WriteHalf};
use tokio::net::tcp::OwnedWriteHalf;

/// The outbound half of a client transport, wrapping the concrete stream types the
/// relay can write to behind a single type.
#[derive(Debug)]
pub enum ClientWriter {
    Tcp(OwnedWriteHalf),
    /// An in-process pipe, used when embedding the relay logic without sockets.
    Memory(WriteHalf<DuplexStream>),
}

impl From<OwnedWriteHalf> for ClientWriter {
    fn from(half: OwnedWriteHalf) -> Self {
        ClientWriter::Tcp(half)
    }
}

impl From<WriteHalf<DuplexStream>> for ClientWriter {
    fn from(half: WriteHalf<DuplexStream>) -> Self {
        ClientWriter::Memory(half)
    }
}

impl AsyncWrite for ClientWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, std::io::Error>> {
        match self.get_mut() {
            ClientWriter::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            ClientWriter::Memory(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), std::io::Error>> {
        match self.get_mut() {
            ClientWriter::Tcp(s) => Pin::new(s).poll_flush(cx),
            ClientWriter::Memory(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), std::io::Error>> {
        match self.get_mut() {
            ClientWriter::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            ClientWriter::Memory(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}
