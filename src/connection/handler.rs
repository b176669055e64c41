// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::guard::ConnectionGuard;
use super::session::SessionState;
use crate::core::protocol::LineCodec;
use crate::core::registry::{ClientEntry, Outbox, SessionId};
use crate::core::state::ServerState;
use crate::core::{ChatError, ClientCommand};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

const SHUTDOWN_NOTICE: &str = "server> server is shutting down.";
const FAREWELL_NOTICE: &str = "server> connection closing. goodbye.";
const WHISPER_USAGE_NOTICE: &str = "server> usage: /w <nickname> <message>";

/// The next step for the connection's main loop to take.
enum NextAction {
    Continue,
    ExitLoop,
}

/// Manages the full lifecycle of a client connection.
///
/// A single task drives the whole session: it reads inbound frames, drains
/// the session's outbox onto the socket, and listens for the global shutdown
/// signal. Because there is only one writer, every recipient observes its
/// deliveries in enqueue order.
pub struct ConnectionHandler {
    framed: Framed<TcpStream, LineCodec>,
    addr: SocketAddr,
    state: Arc<ServerState>,
    session_id: SessionId,
    shutdown_rx: broadcast::Receiver<()>,
    outbox_tx: Outbox,
    outbox_rx: mpsc::UnboundedReceiver<String>,
    session: SessionState,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler` for an accepted socket.
    pub fn new(
        socket: TcpStream,
        addr: SocketAddr,
        state: Arc<ServerState>,
        session_id: SessionId,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let codec = LineCodec::new(state.config.max_line_len);
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        Self {
            framed: Framed::new(socket, codec),
            addr,
            state,
            session_id,
            shutdown_rx,
            outbox_tx,
            outbox_rx,
            session: SessionState::new(),
        }
    }

    /// The main event loop for the connection: nickname registration first,
    /// then command processing until quit, disconnect, or server shutdown.
    pub async fn run(&mut self) -> Result<(), ChatError> {
        // Cleanup and the single departure announcement happen when this
        // guard drops, on every exit path.
        let _guard = ConnectionGuard::new(self.state.clone(), self.session_id, self.addr);

        if !self.register().await? {
            return Ok(());
        }

        loop {
            tokio::select! {
                // Prioritize the shutdown signal over other events.
                biased;
                _ = self.shutdown_rx.recv() => {
                    info!("Connection handler for {} received shutdown signal.", self.addr);
                    let _ = self.framed.send(SHUTDOWN_NOTICE.to_string()).await;
                    break;
                }
                Some(outbound) = self.outbox_rx.recv() => {
                    if let Err(e) = self.framed.send(outbound).await {
                        debug!("Delivery to {} failed: {}", self.addr, e);
                        break;
                    }
                }
                result = self.framed.next() => {
                    match result {
                        Some(Ok(line)) => match self.process_line(&line).await {
                            Ok(NextAction::Continue) => {}
                            Ok(NextAction::ExitLoop) => break,
                            Err(e) => {
                                if self.send_notice_to_client(e).await.is_err() {
                                    break;
                                }
                            }
                        },
                        Some(Err(e)) => {
                            if is_normal_disconnect(&e) {
                                debug!("Connection from {} closed by peer: {}", self.addr, e);
                            } else {
                                warn!("Connection error for {}: {}", self.addr, e);
                            }
                            break;
                        }
                        None => {
                            debug!("Connection from {} closed by peer.", self.addr);
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Waits for the first frame, which must carry the nickname, and
    /// registers the session. Returns `Ok(false)` when the session ended
    /// before entering the chat: an empty nickname is discarded without
    /// registration or announcement.
    async fn register(&mut self) -> Result<bool, ChatError> {
        let first = tokio::select! {
            biased;
            _ = self.shutdown_rx.recv() => {
                let _ = self.framed.send(SHUTDOWN_NOTICE.to_string()).await;
                return Ok(false);
            }
            result = self.framed.next() => match result {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    if is_normal_disconnect(&e) {
                        debug!("Connection from {} closed before registering: {}", self.addr, e);
                        return Ok(false);
                    }
                    return Err(e);
                }
                None => {
                    debug!("Connection from {} closed before registering.", self.addr);
                    return Ok(false);
                }
            }
        };

        let nickname = first.trim();
        if nickname.is_empty() {
            debug!("Empty nickname from {}, closing without registration.", self.addr);
            return Ok(false);
        }

        self.session.nickname = Some(nickname.to_string());
        self.state.registry.register(ClientEntry {
            session_id: self.session_id,
            nickname: nickname.to_string(),
            addr: self.addr,
            outbox: self.outbox_tx.clone(),
        });
        info!(
            "Session {} registered as '{}' from {}.",
            self.session_id, nickname, self.addr
        );
        self.state.router.announce(&format!("{nickname} has joined."));
        Ok(true)
    }

    /// Classifies one inbound line and routes it.
    async fn process_line(&mut self, line: &str) -> Result<NextAction, ChatError> {
        let msg = line.trim();
        let nickname = self
            .session
            .nickname
            .clone()
            .ok_or_else(|| ChatError::Internal("line processed before registration".into()))?;

        match ClientCommand::parse(msg)? {
            ClientCommand::Quit => {
                // Farewell goes to this session only; the departure broadcast
                // is the cleanup guard's job.
                let _ = self.framed.send(FAREWELL_NOTICE.to_string()).await;
                Ok(NextAction::ExitLoop)
            }
            ClientCommand::Whisper { target, body } => {
                self.state.stats.increment_total_messages();
                self.state
                    .router
                    .whisper(&nickname, self.session_id, &self.outbox_tx, &target, &body);
                Ok(NextAction::Continue)
            }
            ClientCommand::Chat(body) => {
                self.state.stats.increment_total_messages();
                self.state.router.chat(&nickname, &body);
                Ok(NextAction::Continue)
            }
        }
    }

    /// Reports a per-command failure to this client only. Anything other
    /// than a malformed whisper is a connection-level fault and bubbles up
    /// so the caller terminates the session.
    async fn send_notice_to_client(&mut self, e: ChatError) -> Result<(), ChatError> {
        match e {
            ChatError::WhisperUsage => {
                debug!("Session {}: malformed whisper.", self.session_id);
                self.framed.send(WHISPER_USAGE_NOTICE.to_string()).await
            }
            other => Err(other),
        }
    }
}

/// Helper function to check for non-critical disconnection errors.
fn is_normal_disconnect(e: &ChatError) -> bool {
    matches!(e, ChatError::Io(arc_err) if matches!(
        arc_err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    ))
}
