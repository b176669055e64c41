// src/core/router.rs

//! Broadcast and whisper routing on top of the client registry.

use crate::core::registry::{ClientRegistry, Outbox, SessionId};
use std::sync::Arc;
use tracing::debug;

/// Prefix for system notices.
const SYSTEM_PREFIX: &str = "server> ";

/// Resolves recipients through the registry and enqueues deliveries on their
/// outboxes. Never performs socket I/O itself and never holds the registry
/// lock while delivering.
#[derive(Debug)]
pub struct MessageRouter {
    registry: Arc<ClientRegistry>,
}

impl MessageRouter {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Delivers `text` to every registered session, including the sender's
    /// own. Returns the number of sessions the message was enqueued for.
    ///
    /// Delivery is best-effort: an enqueue fails only when the receiving
    /// session has already dropped its queue during teardown. That session's
    /// cleanup guard deregisters it and announces the departure, so the
    /// failure is not acted on here and broadcast is never re-entered.
    pub fn broadcast(&self, text: &str) -> usize {
        let mut delivered = 0;
        for entry in self.registry.snapshot() {
            if entry.outbox.send(text.to_string()).is_ok() {
                delivered += 1;
            } else {
                debug!(
                    "Dropping broadcast to '{}' ({}): session is closing.",
                    entry.nickname, entry.addr
                );
            }
        }
        delivered
    }

    /// Broadcasts a chat line as `<nickname>> <body>`.
    pub fn chat(&self, nickname: &str, body: &str) -> usize {
        self.broadcast(&format!("{nickname}> {body}"))
    }

    /// Broadcasts a system notice as `server> <message>`. Used for join,
    /// departure, and other server-originated announcements.
    pub fn announce(&self, message: &str) -> usize {
        self.broadcast(&format!("{SYSTEM_PREFIX}{message}"))
    }

    /// Delivers a whisper to the first session registered under `target`.
    ///
    /// An unknown target is reported to the sender only. On success the
    /// target receives `(whisper) <sender>> <body>` and the sender a
    /// confirmation, unless the target is the sender's own session, in which
    /// case exactly one delivery occurs.
    pub fn whisper(
        &self,
        sender: &str,
        sender_id: SessionId,
        sender_outbox: &Outbox,
        target: &str,
        body: &str,
    ) {
        let Some(entry) = self.registry.find_by_nickname(target) else {
            let _ = sender_outbox.send(format!("{SYSTEM_PREFIX}target nickname not found: {target}"));
            return;
        };

        if entry.outbox.send(format!("(whisper) {sender}> {body}")).is_err() {
            // The target is tearing down; no confirmation for a message that
            // was never enqueued.
            debug!("Dropping whisper to '{}': session is closing.", entry.nickname);
            return;
        }
        if entry.session_id != sender_id {
            let _ = sender_outbox.send(format!("(whisper sent) {sender} -> {target}> {body}"));
        }
    }
}
