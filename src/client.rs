// src/client.rs

//! The client side of the relay protocol, used by the `chatrelay-client` binary.

use crate::core::RelayError;
use crate::core::protocol::{ChunkCodec, parse_name_list};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// How long to wait for the user list after sending the name. The relay sends nothing
/// at all when nobody else is online, so silence means an empty list.
pub const HANDSHAKE_REPLY_TIMEOUT: Duration = Duration::from_millis(500);

pub type ClientReader = FramedRead<OwnedReadHalf, ChunkCodec>;
pub type ClientSink = FramedWrite<OwnedWriteHalf, ChunkCodec>;

/// Where the client connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub address: String,
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ClientConfig {
    /// Reads `ADDRESS` and `PORT` through `lookup`, keeping defaults for anything unset.
    pub fn from_env<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(address) = lookup(crate::config::ENV_ADDRESS)
            && !address.trim().is_empty()
        {
            config.address = address;
        }
        if let Some(port) = lookup(crate::config::ENV_PORT) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid PORT value '{port}'"))?;
        }
        Ok(config)
    }
}

/// A connected, registered chat client.
pub struct ChatClient {
    name: String,
    others: Vec<String>,
    reader: ClientReader,
    sink: ClientSink,
}

impl ChatClient {
    /// Connects, sends `name` and waits for the list of people already online.
    pub async fn connect(config: &ClientConfig, name: &str) -> Result<Self, RelayError> {
        let stream = TcpStream::connect((config.address.as_str(), config.port)).await?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, ChunkCodec::default());
        let mut sink = FramedWrite::new(write_half, ChunkCodec::default());

        sink.send(Bytes::copy_from_slice(name.as_bytes()))
            .await
            .map_err(|e| RelayError::HandshakeFailed(format!("could not send name: {e}")))?;

        let others = match tokio::time::timeout(HANDSHAKE_REPLY_TIMEOUT, reader.next()).await {
            Err(_) => Vec::new(),
            Ok(Some(Ok(reply))) => {
                let reply = String::from_utf8_lossy(&reply);
                parse_name_list(&reply)
                    .into_iter()
                    .filter(|other| other != name)
                    .collect()
            }
            Ok(Some(Err(e))) => return Err(e),
            Ok(None) => {
                return Err(RelayError::HandshakeFailed(
                    "relay closed the connection during the handshake".to_string(),
                ));
            }
        };
        debug!("Joined as {:?}; already online: {:?}", name, others);

        Ok(Self {
            name: name.to_string(),
            others,
            reader,
            sink,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The people who were online when this client joined.
    pub fn others(&self) -> &[String] {
        &self.others
    }

    /// The line printed right after joining.
    pub fn greeting(&self) -> String {
        greeting(&self.name, &self.others)
    }

    pub async fn send(&mut self, text: &str) -> Result<(), RelayError> {
        self.sink.send(Bytes::copy_from_slice(text.as_bytes())).await
    }

    /// Waits for the next inbound chunk. `None` means the relay closed the connection.
    pub async fn recv(&mut self) -> Option<Result<String, RelayError>> {
        let chunk = self.reader.next().await?;
        Some(chunk.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Splits the client so receiving and sending can run concurrently.
    pub fn into_parts(self) -> (ClientReader, ClientSink) {
        (self.reader, self.sink)
    }
}

pub fn greeting(name: &str, others: &[String]) -> String {
    if others.is_empty() {
        format!("You joined the chat as \"{name}\". You are the first to join.")
    } else {
        format!(
            "You joined the chat as \"{name}\". People in the chatroom: {}",
            others.join(", ")
        )
    }
}
