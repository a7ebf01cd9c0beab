// src/server/connection_loop.rs

//! Contains the acceptor loop: it accepts connections, hands each one to its own task
//! for the handshake and receive loop, and exits when shutdown is requested.

use super::context::ServerContext;
use super::handshake;
use super::shutdown;
use crate::core::state::ServerState;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, warn};

/// The main loop that accepts connections until `shutdown` resolves, then runs the
/// shutdown sequence.
pub async fn run<F>(mut ctx: ServerContext, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut client_tasks = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested.");
                break;
            }

            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => error!("Background task failed: {}", e),
                    Err(e) => error!("Background task panicked: {e:?}"),
                }
            },

            res = ctx.listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        debug!("Accepted new connection from: {}", addr);
                        ctx.state.stats.increment_total_connections();
                        client_tasks.spawn(serve_connection(ctx.state.clone(), socket, addr));
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A connection worker panicked: {e:?}");
                }
            },
        }
    }

    shutdown::run(ctx, client_tasks).await;
}

/// Runs the handshake for one connection and, if it succeeds, its worker.
async fn serve_connection(state: Arc<ServerState>, socket: TcpStream, addr: SocketAddr) {
    let id = state.next_client_id();
    let (read_half, write_half) = socket.into_split();
    let reader = FramedRead::new(read_half, state.codec());

    match handshake::perform(&state, id, addr, reader, write_half).await {
        Ok(handler) => {
            let reason = handler.run().await;
            debug!("Worker for {} ({}) finished: {:?}", id, addr, reason);
        }
        Err(e) => {
            state.stats.increment_failed_handshakes();
            debug!("Dropping connection from {} after failed handshake: {}", addr, e);
        }
    }
}
