// src/core/protocol/mod.rs

//! The plain-text wire protocol: a delimiter-free chunk codec and the message formats
//! built on top of it.

pub mod chunk_codec;
pub mod message;

pub use chunk_codec::{ChunkCodec, DEFAULT_MAX_CHUNK};
pub use message::{
    chat_line, decode_display_name, decode_text, joined_line, left_line, name_list,
    parse_name_list,
};
