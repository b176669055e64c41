// src/core/registry.rs

//! The shared table of live, registered sessions.

use parking_lot::Mutex;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Identifies one accepted connection for the lifetime of the process.
pub type SessionId = u64;

/// Sending half of a session's outbound delivery queue. The owning session
/// task drains the queue and performs the actual socket writes, so enqueuing
/// a delivery never blocks on a slow peer.
pub type Outbox = mpsc::UnboundedSender<String>;

/// One registered session as seen by the registry and the router.
#[derive(Debug, Clone)]
pub struct ClientEntry {
    pub session_id: SessionId,
    pub nickname: String,
    pub addr: SocketAddr,
    pub outbox: Outbox,
}

/// Maps live connections to their chosen nicknames.
///
/// All reads and writes are serialized through one exclusive lock. Lock hold
/// times stay bounded regardless of recipient count because delivery happens
/// on [`snapshot`](Self::snapshot) copies outside the lock. Nicknames are not
/// unique; lookups return the earliest-registered match.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    entries: Mutex<Vec<ClientEntry>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Inserts a session. The caller guarantees the nickname is non-empty
    /// after trimming; an empty nickname must be refused before this point.
    pub fn register(&self, entry: ClientEntry) {
        self.entries.lock().push(entry);
    }

    /// Removes a session, returning its nickname if it was registered.
    /// Idempotent: removing the same session twice yields `None` the second
    /// time, which is what keeps departure announcements single-shot.
    pub fn remove(&self, session_id: SessionId) -> Option<String> {
        let mut entries = self.entries.lock();
        let pos = entries.iter().position(|e| e.session_id == session_id)?;
        Some(entries.remove(pos).nickname)
    }

    /// Linear scan for the first entry registered under `name`.
    pub fn find_by_nickname(&self, name: &str) -> Option<ClientEntry> {
        self.entries.lock().iter().find(|e| e.nickname == name).cloned()
    }

    /// A point-in-time copy of all live entries, for iteration outside the
    /// lock.
    pub fn snapshot(&self) -> Vec<ClientEntry> {
        self.entries.lock().clone()
    }

    /// Drops every entry at once. Used during server shutdown, after which
    /// individual session cleanup finds nothing left to announce.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
