// src/server/initialization.rs

//! Handles relay initialization: state setup, backup file preparation and binding the
//! listener.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::persistence::BackupWriter;
use crate::core::state::ServerState;
use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Initializes all relay components before starting the main loop.
///
/// Failing to bind or listen is the only fatal error; a backup file that cannot be
/// prepared is logged and the relay carries on.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let backup = BackupWriter::new(config.backup_path.clone());
    if let Err(e) = backup.prepare().await {
        warn!(
            "Could not prepare backup file '{}': {}. Backups may fail.",
            backup.path().display(),
            e
        );
    }

    let listener = bind_listener(&config).await?;
    let local_addr = listener.local_addr()?;

    let state = Arc::new(ServerState::new(config));
    state.conversation.announce(format!(
        "Started server on {}, port {}",
        state.config.host,
        local_addr.port()
    ));

    Ok(ServerContext {
        state,
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

/// Binds the listening socket with the configured pending-connection backlog.
async fn bind_listener(config: &Config) -> Result<TcpListener> {
    let addr = tokio::net::lookup_host((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to resolve {}:{}", config.host, config.port))?
        .next()
        .ok_or_else(|| anyhow!("No address found for {}:{}", config.host, config.port))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("Failed to bind {addr}"))?;
    let listener = socket
        .listen(config.backlog)
        .with_context(|| format!("Failed to listen on {addr}"))?;
    info!("Relay listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    info!(
        "Backing up the conversation to '{}' every {:?}.",
        config.backup_path.display(),
        config.backup_interval
    );
    info!(
        "Accepting up to {} pending connections; messages are read in chunks of {} bytes.",
        config.backlog, config.max_message_bytes
    );
}
