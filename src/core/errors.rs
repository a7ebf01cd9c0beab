// src/core/errors.rs

//! Defines the primary error type for the relay.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all failures a connection, the registry or the
/// backup subsystem can surface. None of these is fatal to the relay as a whole.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    /// Inbound bytes that cannot be decoded as text.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),
}

// `std::io::Error` is not cloneable, so it is shared through an `Arc`.
impl Clone for RelayError {
    fn clone(&self) -> Self {
        match self {
            RelayError::Io(e) => RelayError::Io(Arc::clone(e)),
            RelayError::InvalidMessage(s) => RelayError::InvalidMessage(s.clone()),
            RelayError::HandshakeFailed(s) => RelayError::HandshakeFailed(s.clone()),
        }
    }
}

impl PartialEq for RelayError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RelayError::Io(e1), RelayError::Io(e2)) => e1.kind() == e2.kind(),
            (RelayError::InvalidMessage(s1), RelayError::InvalidMessage(s2)) => s1 == s2,
            (RelayError::HandshakeFailed(s1), RelayError::HandshakeFailed(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl RelayError {
    /// True for the error kinds a peer produces by simply going away.
    pub fn is_normal_disconnect(&self) -> bool {
        match self {
            RelayError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        RelayError::Io(Arc::new(e))
    }
}

impl From<std::str::Utf8Error> for RelayError {
    fn from(e: std::str::Utf8Error) -> Self {
        RelayError::InvalidMessage(e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for RelayError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        RelayError::InvalidMessage(e.to_string())
    }
}
