// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

use chatrelay::client::{ChatClient, ClientConfig};
use chatrelay::config::Config;
use chatrelay::core::state::ServerState;
use chatrelay::server;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing_subscriber::EnvFilter;

/// How long a test waits for something that should happen.
pub const WAIT: Duration = Duration::from_secs(5);
/// How long a test waits to be reasonably sure something does not happen.
pub const QUIET: Duration = Duration::from_millis(300);

/// A relay running on an ephemeral localhost port with its backup in a temp dir.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub state: Arc<ServerState>,
    pub backup_path: PathBuf,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    _dir: TempDir,
}

impl TestRelay {
    /// Starts a relay whose periodic backup effectively never fires on its own.
    pub async fn start() -> Self {
        Self::with_backup_interval(Duration::from_secs(3600)).await
    }

    pub async fn with_backup_interval(interval: Duration) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("warn"))
            .with_test_writer()
            .try_init();

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let backup_path = dir.path().join("backup").join("Backup.txt");

        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            backup_path: backup_path.clone(),
            backup_interval: interval,
            shutdown_grace: Duration::from_millis(500),
            ..Config::default()
        };

        let ctx = server::setup(config).await.expect("Failed to set up relay");
        let addr = ctx.local_addr().expect("Listener has no local address");
        let state = ctx.state.clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(server::serve(ctx, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            state,
            backup_path,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            _dir: dir,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            address: self.addr.ip().to_string(),
            port: self.addr.port(),
        }
    }

    /// Connects a client and waits until the relay has registered it.
    pub async fn join(&self, name: &str) -> ChatClient {
        let before = self.state.registry.len();
        let client = ChatClient::connect(&self.client_config(), name)
            .await
            .expect("Failed to connect test client");
        self.wait_for_clients(before + 1).await;
        client
    }

    /// Opens a bare TCP connection without performing the handshake.
    pub async fn raw(&self) -> TcpStream {
        TcpStream::connect(self.addr)
            .await
            .expect("Failed to open raw connection")
    }

    pub async fn wait_for_clients(&self, count: usize) {
        let state = self.state.clone();
        wait_until(move || state.registry.len() == count).await;
    }

    /// Triggers shutdown and waits for the whole sequence to finish.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            timeout(WAIT, handle)
                .await
                .expect("Relay did not shut down in time")
                .expect("Relay task panicked");
        }
    }

    pub fn backup_contents(&self) -> String {
        std::fs::read_to_string(&self.backup_path).unwrap_or_default()
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Polls `condition` until it holds, panicking after `WAIT`.
pub async fn wait_until<F>(condition: F)
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "Condition not met within {WAIT:?}");
        sleep(Duration::from_millis(10)).await;
    }
}

/// Receives the next message, panicking if nothing arrives in time.
pub async fn recv(client: &mut ChatClient) -> String {
    timeout(WAIT, client.recv())
        .await
        .expect("Timed out waiting for a message")
        .expect("Connection closed while waiting for a message")
        .expect("Error while reading a message")
}

/// Asserts that nothing arrives for a short while.
pub async fn assert_silent(client: &mut ChatClient) {
    if let Ok(message) = timeout(QUIET, client.recv()).await {
        panic!("Expected no message, got {message:?}");
    }
}

/// Reads from a raw stream until EOF, returning whatever arrived.
pub async fn read_to_eof(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    timeout(WAIT, stream.read_to_end(&mut buf))
        .await
        .expect("Timed out waiting for EOF")
        .expect("Error while reading to EOF");
    buf
}
