// src/server/initialization.rs

//! Handles the server initialization process: shared state construction and
//! binding of the listening socket.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::{Context, Result, anyhow};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;
use tracing::info;

/// Initializes all server components before starting the main loop.
/// A bind failure here is fatal; the server must not start serving.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let state = ServerState::new(config);
    let connection_permits = Arc::new(Semaphore::new(state.config.max_clients));

    let listener = bind_listener(&state.config)?;
    info!("linechat server listening on {}.", listener.local_addr()?);

    Ok(ServerContext {
        state,
        listener,
        shutdown_tx,
        client_tasks: JoinSet::new(),
        connection_permits,
    })
}

/// Binds the listening socket with address reuse enabled, so a restarted
/// server can rebind while old connections linger in TIME_WAIT.
fn bind_listener(config: &Config) -> Result<TcpListener> {
    let addr: SocketAddr = (config.host.as_str(), config.port)
        .to_socket_addrs()
        .with_context(|| {
            format!(
                "Failed to resolve listen address '{}:{}'",
                config.host, config.port
            )
        })?
        .next()
        .ok_or_else(|| {
            anyhow!(
                "Listen address '{}:{}' did not resolve to any address",
                config.host,
                config.port
            )
        })?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("Failed to bind {addr}"))?;
    socket.listen(1024).context("Failed to listen")
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    info!(
        "Server configured for up to {} concurrent clients.",
        config.max_clients
    );
    info!("Maximum line length set to {} bytes.", config.max_line_len);
}
