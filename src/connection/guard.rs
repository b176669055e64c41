// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::registry::SessionId;
use crate::core::state::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// An RAII guard to ensure connection resources are always cleaned up when a
/// connection handler's scope is exited, whether through quit, read failure,
/// or server shutdown.
pub struct ConnectionGuard {
    state: Arc<ServerState>,
    session_id: SessionId,
    addr: SocketAddr,
}

impl ConnectionGuard {
    pub(crate) fn new(state: Arc<ServerState>, session_id: SessionId, addr: SocketAddr) -> Self {
        Self {
            state,
            session_id,
            addr,
        }
    }
}

impl Drop for ConnectionGuard {
    /// Deregisters the session and, if it had a registered nickname,
    /// announces the departure. Registry removal is idempotent and the
    /// announcement is keyed on its return, so a session cleared elsewhere
    /// (server shutdown, or never registered at all) is not announced.
    fn drop(&mut self) {
        match self.state.registry.remove(self.session_id) {
            Some(nickname) => {
                debug!(
                    "ConnectionGuard dropping, deregistering '{}' ({}).",
                    nickname, self.addr
                );
                self.state.router.announce(&format!("{nickname} has left."));
            }
            None => {
                debug!(
                    "Session {} ({}) was not in the registry upon cleanup.",
                    self.session_id, self.addr
                );
            }
        }
    }
}
