// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and handling graceful shutdown.

use super::context::ServerContext;
use crate::connection::ConnectionHandler;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, error, info, warn};

/// The main server loop that accepts connections and handles graceful shutdown.
pub async fn run(mut ctx: ServerContext) {
    let mut session_id_counter: u64 = 0;

    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to create SIGINT stream");
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to create SIGTERM stream");
    // Programmatic shutdown requests arrive through the same channel the
    // session tasks listen on.
    let mut shutdown_rx = ctx.shutdown_tx.subscribe();

    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break;
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown requested, initiating graceful shutdown.");
                break;
            }

            res = ctx.listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        let Ok(permit) = ctx.connection_permits.clone().try_acquire_owned() else {
                            warn!("Connection from {} refused: client limit reached.", addr);
                            continue;
                        };
                        info!("Accepted new connection from: {}", addr);
                        ctx.state.stats.increment_total_connections();

                        session_id_counter = session_id_counter.wrapping_add(1);
                        let session_id = session_id_counter;
                        let state = ctx.state.clone();
                        let shutdown_rx = ctx.shutdown_tx.subscribe();

                        ctx.client_tasks.spawn(async move {
                            let mut handler =
                                ConnectionHandler::new(socket, addr, state, session_id, shutdown_rx);
                            if let Err(e) = handler.run().await {
                                warn!("Connection from {} terminated unexpectedly: {}", addr, e);
                            }
                            drop(permit);
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            },

            Some(res) = ctx.client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            },
        }
    }

    info!("Shutting down. Sending signal to all sessions.");
    if ctx.shutdown_tx.send(()).is_err() {
        debug!("No live sessions to notify of shutdown.");
    }
    // Cleared centrally so that per-session cleanup guards do not broadcast
    // departures into a server that is going away.
    ctx.state.registry.clear();

    // Sessions exit on their own once they observe the signal; give them a
    // moment to write the shutdown notice before aborting stragglers.
    let drained = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while ctx.client_tasks.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("Timed out waiting for sessions to finish; aborting the remainder.");
        ctx.client_tasks.shutdown().await;
    }
    info!("All client connections closed.");
    info!(
        "Server shutdown complete. {} connections served, {} messages relayed.",
        ctx.state.stats.get_total_connections(),
        ctx.state.stats.get_total_messages(),
    );
}
