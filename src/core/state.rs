// src/core/state.rs

//! The shared server state handed to every session worker.

use crate::config::Config;
use crate::core::registry::ClientRegistry;
use crate::core::router::MessageRouter;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Everything a session worker needs: configuration, the client registry,
/// the message router, and server-wide statistics. Constructed once at
/// startup and shared as `Arc<ServerState>`.
#[derive(Debug)]
pub struct ServerState {
    pub config: Config,
    pub registry: Arc<ClientRegistry>,
    pub router: MessageRouter,
    pub stats: StatsState,
}

impl ServerState {
    pub fn new(config: Config) -> Arc<Self> {
        let registry = Arc::new(ClientRegistry::new());
        Arc::new(Self {
            config,
            router: MessageRouter::new(registry.clone()),
            registry,
            stats: StatsState::new(),
        })
    }
}

/// Holds all state and logic related to server-wide statistics.
#[derive(Debug)]
pub struct StatsState {
    /// The total number of connections accepted by the server since startup.
    total_connections: AtomicU64,
    /// The total number of chat and whisper messages routed since startup.
    total_messages: AtomicU64,
}

impl Default for StatsState {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsState {
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            total_messages: AtomicU64::new(0),
        }
    }

    /// Atomically increments the total number of connections received.
    pub fn increment_total_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Atomically increments the total number of messages routed.
    pub fn increment_total_messages(&self) {
        self.total_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_total_messages(&self) -> u64 {
        self.total_messages.load(Ordering::Relaxed)
    }
}
