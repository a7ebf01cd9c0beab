// tests/integration/backup_test.rs

//! Integration tests for the periodic conversation backup.

use super::test_helpers::{TestRelay, recv, wait_until};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn test_backup_file_is_created_empty_at_startup() {
    let relay = TestRelay::start().await;

    assert!(relay.backup_path.exists());
    assert_eq!(relay.backup_contents(), "");
}

#[tokio::test]
async fn test_periodic_flush_writes_buffered_lines_then_leaves_file_alone() {
    let relay = TestRelay::with_backup_interval(Duration::from_millis(200)).await;
    let mut alice = relay.join("alice").await;
    let mut bob = relay.join("bob").await;
    assert_eq!(recv(&mut alice).await, "bob joined the chat!");
    alice.send("hi").await.unwrap();
    assert_eq!(recv(&mut bob).await, "alice says: hi");

    let path = relay.backup_path.clone();
    wait_until(move || {
        std::fs::read_to_string(&path)
            .map(|c| c.contains("alice says: hi"))
            .unwrap_or(false)
    })
    .await;

    let first = relay.backup_contents();
    assert!(first.ends_with("alice says: hi\n"));

    // Nothing new happens: later ticks must not touch the file.
    sleep(Duration::from_millis(600)).await;
    assert_eq!(relay.backup_contents(), first);
}

#[tokio::test]
async fn test_each_flush_replaces_the_previous_batch() {
    let relay = TestRelay::with_backup_interval(Duration::from_millis(200)).await;
    let mut alice = relay.join("alice").await;
    let mut bob = relay.join("bob").await;
    assert_eq!(recv(&mut alice).await, "bob joined the chat!");

    alice.send("first").await.unwrap();
    assert_eq!(recv(&mut bob).await, "alice says: first");
    let path = relay.backup_path.clone();
    wait_until(move || {
        std::fs::read_to_string(&path)
            .map(|c| c.contains("alice says: first"))
            .unwrap_or(false)
    })
    .await;

    alice.send("second").await.unwrap();
    assert_eq!(recv(&mut bob).await, "alice says: second");
    let path = relay.backup_path.clone();
    wait_until(move || {
        std::fs::read_to_string(&path)
            .map(|c| c.contains("alice says: second"))
            .unwrap_or(false)
    })
    .await;

    let contents = relay.backup_contents();
    assert_eq!(contents, "alice says: second\n");
}

#[tokio::test]
async fn test_shutdown_flushes_remaining_lines() {
    let mut relay = TestRelay::start().await;
    let mut alice = relay.join("alice").await;
    let mut bob = relay.join("bob").await;
    assert_eq!(recv(&mut alice).await, "bob joined the chat!");
    bob.send("bye").await.unwrap();
    assert_eq!(recv(&mut alice).await, "bob says: bye");

    relay.shutdown().await;

    let contents = relay.backup_contents();
    let lines: Vec<&str> = contents.lines().collect();
    assert!(lines[0].starts_with("Started server on"));
    assert!(lines.contains(&"alice joined the chat!"));
    assert!(lines.contains(&"bob says: bye"));
    assert_eq!(lines.last(), Some(&"Server shutting down."));
}
