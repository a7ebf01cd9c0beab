// src/core/state/registry.rs

//! The client registry: the single source of truth for who is online.
//!
//! Every operation takes the registry lock only long enough to mutate the map and copy
//! out what the caller needs. Network I/O always happens on those copies after the lock
//! has been released.

use crate::connection::PeerHandle;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::net::SocketAddr;

/// Identifies one live connection for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// A registered client. The display name is fixed at handshake time.
#[derive(Debug, Clone)]
pub struct ClientEntry {
    pub name: String,
    pub peer: PeerHandle,
}

impl ClientEntry {
    pub fn addr(&self) -> SocketAddr {
        self.peer.addr()
    }
}

/// What a newly registered client needs, copied in the same critical section as the
/// insert.
#[derive(Debug)]
pub struct Registration {
    /// Names of every other client online at that instant, in join order.
    pub other_names: Vec<String>,
    /// Every other live connection; the join announcement goes to exactly these.
    pub recipients: Vec<PeerHandle>,
}

/// The result of removing a client that was still registered.
#[derive(Debug)]
pub struct Departure {
    pub name: String,
    /// The connections still online after the removal.
    pub recipients: Vec<PeerHandle>,
}

/// A point-in-time copy used for one chat broadcast.
#[derive(Debug)]
pub struct BroadcastSnapshot {
    pub sender_name: String,
    pub recipients: Vec<PeerHandle>,
}

#[derive(Debug, Default)]
struct Clients {
    entries: IndexMap<ClientId, ClientEntry>,
    /// Set by `drain_all`; no client can register afterwards.
    closed: bool,
}

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<Clients>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a client and returns the snapshot the join handshake needs. Returns
    /// `None` once the registry has been drained for shutdown.
    ///
    /// Registering an id twice replaces the previous entry.
    pub fn register(&self, name: impl Into<String>, peer: PeerHandle) -> Option<Registration> {
        let id = peer.id();
        let mut guard = self.clients.lock();
        if guard.closed {
            return None;
        }
        let clients = &mut guard.entries;
        clients.insert(
            id,
            ClientEntry {
                name: name.into(),
                peer,
            },
        );
        let mut other_names = Vec::with_capacity(clients.len().saturating_sub(1));
        let mut recipients = Vec::with_capacity(clients.len().saturating_sub(1));
        for (other_id, entry) in clients.iter() {
            if *other_id != id {
                other_names.push(entry.name.clone());
                recipients.push(entry.peer.clone());
            }
        }
        Some(Registration {
            other_names,
            recipients,
        })
    }

    /// Removes a client. Returns `None` when the client was already gone, which tells
    /// the caller that someone else has handled the departure.
    pub fn remove(&self, id: ClientId) -> Option<Departure> {
        let mut guard = self.clients.lock();
        let entry = guard.entries.shift_remove(&id)?;
        let recipients = guard.entries.values().map(|e| e.peer.clone()).collect();
        Some(Departure {
            name: entry.name,
            recipients,
        })
    }

    /// Copies the sender's name and every other connection. Returns `None` if the
    /// sender is no longer registered.
    pub fn snapshot_excluding(&self, id: ClientId) -> Option<BroadcastSnapshot> {
        let guard = self.clients.lock();
        let clients = &guard.entries;
        let sender_name = clients.get(&id)?.name.clone();
        let recipients = clients
            .iter()
            .filter(|(other_id, _)| **other_id != id)
            .map(|(_, entry)| entry.peer.clone())
            .collect();
        Some(BroadcastSnapshot {
            sender_name,
            recipients,
        })
    }

    /// Empties and closes the registry, returning every connection that was live.
    pub fn drain_all(&self) -> Vec<PeerHandle> {
        let mut guard = self.clients.lock();
        guard.closed = true;
        guard.entries.drain(..).map(|(_, entry)| entry.peer).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.clients.lock().closed
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.lock().entries.contains_key(&id)
    }

    /// Display names of everyone online, in join order.
    pub fn names(&self) -> Vec<String> {
        self.clients
            .lock()
            .entries
            .values()
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().entries.is_empty()
    }
}
