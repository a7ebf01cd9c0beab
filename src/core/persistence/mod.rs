// src/core/persistence/mod.rs

//! Durable storage for the relay: the rolling conversation backup.

mod backup;

pub use backup::BackupWriter;
