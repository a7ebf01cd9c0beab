// tests/integration/chat_test.rs

//! End-to-end tests for the join handshake, message relaying and departures.

use super::test_helpers::{TestRelay, assert_silent, read_to_eof, recv, wait_until};
use tokio::io::AsyncWriteExt;

// ===== Handshake =====

#[tokio::test]
async fn test_first_client_sees_nobody_online() {
    let relay = TestRelay::start().await;

    let alice = relay.join("alice").await;

    assert!(alice.others().is_empty());
    assert_eq!(
        alice.greeting(),
        "You joined the chat as \"alice\". You are the first to join."
    );
    assert_eq!(relay.state.registry.names(), vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_second_client_receives_name_list_and_first_is_notified() {
    let relay = TestRelay::start().await;
    let mut alice = relay.join("alice").await;

    let bob = relay.join("bob").await;

    assert_eq!(bob.others(), ["alice".to_string()]);
    assert_eq!(recv(&mut alice).await, "bob joined the chat!");
}

#[tokio::test]
async fn test_name_list_excludes_the_new_client_and_keeps_join_order() {
    let relay = TestRelay::start().await;
    let mut alice = relay.join("alice").await;
    let mut bob = relay.join("bob").await;
    assert_eq!(recv(&mut alice).await, "bob joined the chat!");

    let carol = relay.join("carol").await;

    assert_eq!(carol.others(), ["alice".to_string(), "bob".to_string()]);
    assert_eq!(recv(&mut alice).await, "carol joined the chat!");
    assert_eq!(recv(&mut bob).await, "carol joined the chat!");
}

#[tokio::test]
async fn test_failed_handshakes_do_not_register_or_stop_the_relay() {
    let relay = TestRelay::start().await;

    // Closes without ever sending a name.
    let silent = relay.raw().await;
    drop(silent);

    // Sends a name that is not text.
    let mut garbled = relay.raw().await;
    garbled.write_all(&[0xff, 0xfe, 0xfd]).await.unwrap();
    let reply = read_to_eof(&mut garbled).await;
    assert!(reply.is_empty());

    let state = relay.state.clone();
    wait_until(move || state.stats.get_failed_handshakes() == 2).await;
    assert!(relay.state.registry.is_empty());

    let alice = relay.join("alice").await;
    assert!(alice.others().is_empty());
    assert_eq!(relay.state.registry.len(), 1);
}

#[tokio::test]
async fn test_registry_size_matches_successful_joins() {
    let relay = TestRelay::start().await;
    let mut clients = Vec::new();
    for i in 0..5 {
        clients.push(relay.join(&format!("user{i}")).await);
    }
    let bad = relay.raw().await;
    drop(bad);

    assert_eq!(relay.state.registry.len(), 5);
}

// ===== Relaying =====

#[tokio::test]
async fn test_message_reaches_others_but_not_sender() {
    let relay = TestRelay::start().await;
    let mut alice = relay.join("alice").await;
    let mut bob = relay.join("bob").await;
    assert_eq!(recv(&mut alice).await, "bob joined the chat!");
    let mut carol = relay.join("carol").await;
    assert_eq!(recv(&mut alice).await, "carol joined the chat!");
    assert_eq!(recv(&mut bob).await, "carol joined the chat!");

    alice.send("hi").await.unwrap();

    assert_eq!(recv(&mut bob).await, "alice says: hi");
    assert_eq!(recv(&mut carol).await, "alice says: hi");
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_message_with_no_peers_is_dropped_quietly() {
    let relay = TestRelay::start().await;
    let mut alice = relay.join("alice").await;

    alice.send("anyone here?").await.unwrap();

    let state = relay.state.clone();
    wait_until(move || state.stats.get_messages_relayed() == 1).await;
    assert_silent(&mut alice).await;
    assert_eq!(relay.state.registry.len(), 1);
}

#[tokio::test]
async fn test_unicode_message_is_relayed_verbatim() {
    let relay = TestRelay::start().await;
    let mut alice = relay.join("alice").await;
    let mut bob = relay.join("bob").await;
    assert_eq!(recv(&mut alice).await, "bob joined the chat!");

    bob.send("héllo wörld").await.unwrap();

    assert_eq!(recv(&mut alice).await, "bob says: héllo wörld");
}

// ===== Departures =====

#[tokio::test]
async fn test_departure_is_announced_and_client_removed() {
    let relay = TestRelay::start().await;
    let alice = relay.join("alice").await;
    let mut bob = relay.join("bob").await;

    drop(alice);

    assert_eq!(recv(&mut bob).await, "alice left the chat!");
    relay.wait_for_clients(1).await;
    assert_eq!(relay.state.registry.names(), vec!["bob".to_string()]);
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_invalid_message_disconnects_only_the_sender() {
    let relay = TestRelay::start().await;
    let mut alice = relay.join("alice").await;

    let mut mallory = relay.raw().await;
    mallory.write_all(b"mallory").await.unwrap();
    relay.wait_for_clients(2).await;
    assert_eq!(recv(&mut alice).await, "mallory joined the chat!");

    mallory.write_all(&[0xc3, 0x28]).await.unwrap();

    assert_eq!(recv(&mut alice).await, "mallory left the chat!");
    relay.wait_for_clients(1).await;

    let mut bob = relay.join("bob").await;
    assert_eq!(recv(&mut alice).await, "bob joined the chat!");
    bob.send("still up?").await.unwrap();
    assert_eq!(recv(&mut alice).await, "bob says: still up?");
}

#[tokio::test]
async fn test_conversation_log_keeps_events_in_order() {
    let relay = TestRelay::start().await;
    let mut alice = relay.join("alice").await;
    let mut bob = relay.join("bob").await;
    assert_eq!(recv(&mut alice).await, "bob joined the chat!");

    alice.send("hi").await.unwrap();
    assert_eq!(recv(&mut bob).await, "alice says: hi");
    drop(alice);
    assert_eq!(recv(&mut bob).await, "alice left the chat!");

    let lines = relay.state.conversation.drain().expect("log should not be empty");
    let position = |needle: &str| {
        lines
            .iter()
            .position(|line| line == needle)
            .unwrap_or_else(|| panic!("{needle:?} not in {lines:?}"))
    };
    assert!(lines[0].starts_with("Started server on 127.0.0.1"));
    assert!(position("bob joined the chat!") < position("alice says: hi"));
    assert!(position("alice says: hi") < position("alice left the chat!"));
    assert!(
        lines
            .iter()
            .any(|line| line.starts_with("Client \"alice\" with address") && line.ends_with("disconnected."))
    );
}
