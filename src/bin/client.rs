// src/bin/client.rs

//! Interactive terminal client for the chat relay.
//!
//! Usage: `chatrelay-client <name>`. Lines typed on stdin are sent as messages; every
//! message from the relay is printed as it arrives.

use bytes::Bytes;
use chatrelay::client::{ChatClient, ClientConfig};
use futures::{SinkExt, StreamExt};
use std::env;
use std::process::ExitCode;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("You must pass the client name as a command line argument.");
        return ExitCode::from(1);
    }
    let name = &args[1];

    let config = match ClientConfig::from_env(|key| env::var(key).ok()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    let client = match ChatClient::connect(&config, name).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Could not connect to server: {e}");
            return ExitCode::from(1);
        }
    };
    println!("Connected to server on address {}", config.address);
    println!("{}", client.greeting());

    let (mut inbound, mut outbound) = client.into_parts();
    let mut stdin = FramedRead::new(tokio::io::stdin(), LinesCodec::new());

    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        _ => {
            eprintln!("Failed to register signal handlers");
            return ExitCode::from(1);
        }
    };

    loop {
        tokio::select! {
            _ = sigint.recv() => {
                println!("Disconnected from server");
                break;
            }
            _ = sigterm.recv() => {
                println!("Disconnected from server");
                break;
            }
            message = inbound.next() => match message {
                Some(Ok(chunk)) => println!("{}", String::from_utf8_lossy(&chunk)),
                Some(Err(_)) | None => {
                    println!("Disconnected from server");
                    break;
                }
            },
            line = stdin.next() => match line {
                Some(Ok(line)) => {
                    if outbound.send(Bytes::from(line)).await.is_err() {
                        println!("Disconnected from server");
                        break;
                    }
                }
                // EOF or unreadable input ends the session.
                Some(Err(_)) | None => break,
            },
        }
    }

    let _ = outbound.close().await;
    // A pending stdin read lives on a blocking thread the runtime would wait for.
    std::process::exit(0)
}
