// src/core/protocol/message.rs

//! Text payloads exchanged with clients and the lines recorded in the conversation log.

use crate::core::RelayError;

/// Separator used when replying to a handshake with the names already online.
pub const NAME_LIST_SEPARATOR: &str = ", ";

/// Decodes inbound bytes as text. Invalid UTF-8 is reported as a recoverable
/// `InvalidMessage` instead of being replaced or escaped.
pub fn decode_text(bytes: &[u8]) -> Result<&str, RelayError> {
    Ok(std::str::from_utf8(bytes)?)
}

/// Decodes the first payload of a connection as a display name.
///
/// Trailing line terminators are stripped so line-oriented tools can be used as
/// clients. An empty name is rejected.
pub fn decode_display_name(bytes: &[u8]) -> Result<String, RelayError> {
    let text = decode_text(bytes)
        .map_err(|e| RelayError::HandshakeFailed(format!("display name is not text: {e}")))?;
    let name = text.trim_end_matches(['\r', '\n']);
    if name.is_empty() {
        return Err(RelayError::HandshakeFailed(
            "display name is empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

pub fn chat_line(sender: &str, text: &str) -> String {
    format!("{sender} says: {text}")
}

pub fn joined_line(name: &str) -> String {
    format!("{name} joined the chat!")
}

pub fn left_line(name: &str) -> String {
    format!("{name} left the chat!")
}

/// Joins the names of the clients already online; empty when nobody else is connected.
pub fn name_list<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(NAME_LIST_SEPARATOR)
}

/// Splits a handshake reply back into names. Used by the companion client.
pub fn parse_name_list(reply: &str) -> Vec<String> {
    if reply.is_empty() {
        return Vec::new();
    }
    reply
        .split(NAME_LIST_SEPARATOR)
        .map(str::to_string)
        .collect()
}
