// src/server/context.rs

use crate::core::state::ServerState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;

/// Holds all the initialized state required to run the server's main loop.
pub struct ServerContext {
    pub state: Arc<ServerState>,
    pub listener: TcpListener,
    /// Fans the shutdown signal out to every session task. Sending on this
    /// channel also stops the accept loop, which is how embedders and tests
    /// shut the server down programmatically.
    pub shutdown_tx: broadcast::Sender<()>,
    pub client_tasks: JoinSet<()>,
    /// Caps the number of concurrently connected clients.
    pub connection_permits: Arc<Semaphore>,
}
