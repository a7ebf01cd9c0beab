// src/core/mod.rs

//! The central module containing the relay's shared state, wire protocol and
//! persistence.

pub mod errors;
pub mod persistence;
pub mod protocol;
pub mod state;
pub mod tasks;

pub use errors::RelayError;
