// src/core/tasks/mod.rs

//! Long-running background tasks that support the relay.

pub mod backup;

pub use backup::BackupTask;
