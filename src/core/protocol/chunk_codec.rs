// src/core/protocol/chunk_codec.rs

//! A delimiter-free `Encoder`/`Decoder` pair. Each decoded item is whatever the
//! transport has delivered so far, capped at a maximum chunk size; encoded items are
//! written to the wire unchanged.

use crate::core::RelayError;
use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// The default upper bound on a single inbound chunk, in bytes.
pub const DEFAULT_MAX_CHUNK: usize = 1024;

/// A `tokio_util::codec` implementation that treats one read as one message.
#[derive(Debug, Clone, Copy)]
pub struct ChunkCodec {
    max_chunk: usize,
}

impl Default for ChunkCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK)
    }
}

impl ChunkCodec {
    /// Creates a codec yielding chunks of at most `max_chunk` bytes. A zero bound is
    /// raised to one byte so the decoder always makes progress.
    pub fn new(max_chunk: usize) -> Self {
        Self {
            max_chunk: max_chunk.max(1),
        }
    }

    pub fn max_chunk(&self) -> usize {
        self.max_chunk
    }
}

impl Decoder for ChunkCodec {
    type Item = BytesMut;
    type Error = RelayError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let mut len = src.len().min(self.max_chunk);
        if src.len() > self.max_chunk {
            len = char_boundary_before(&src[..len]);
        }
        Ok(Some(src.split_to(len)))
    }
}

/// Shortens a capped window so it does not end inside a multi-byte UTF-8 character.
/// The partial character stays buffered for the next chunk. Windows that are invalid
/// for any other reason, or that hold no complete character, are left as they are.
fn char_boundary_before(window: &[u8]) -> usize {
    match std::str::from_utf8(window) {
        Err(e) if e.error_len().is_none() && e.valid_up_to() > 0 => e.valid_up_to(),
        _ => window.len(),
    }
}

impl Encoder<Bytes> for ChunkCodec {
    type Error = RelayError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}
