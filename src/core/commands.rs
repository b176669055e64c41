// src/core/commands.rs

//! Classification of inbound lines into client commands.

use crate::core::ChatError;

/// The token a client sends to disconnect gracefully.
pub const QUIT_TOKEN: &str = "/quit";

/// Recognized whisper prefixes. The trailing space is part of the prefix: a
/// bare `/w` with no arguments is ordinary chat text, matching the reference
/// behavior of the protocol.
const WHISPER_PREFIXES: [&str; 2] = ["/w ", "/whisper "];

/// A single client command, parsed from one trimmed inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Free text, broadcast to every registered session.
    Chat(String),
    /// A direct message to the first session registered under `target`.
    Whisper { target: String, body: String },
    /// Graceful disconnect.
    Quit,
}

impl ClientCommand {
    /// Classifies a trimmed line. A whisper with fewer than three
    /// space-separated tokens is rejected with [`ChatError::WhisperUsage`],
    /// which the session reports to the sender only.
    pub fn parse(line: &str) -> Result<Self, ChatError> {
        if line == QUIT_TOKEN {
            return Ok(ClientCommand::Quit);
        }

        if WHISPER_PREFIXES.iter().any(|p| line.starts_with(p)) {
            let mut parts = line.splitn(3, ' ');
            let _prefix = parts.next();
            let target = parts.next().filter(|t| !t.is_empty());
            let body = parts.next();
            return match (target, body) {
                (Some(target), Some(body)) => Ok(ClientCommand::Whisper {
                    target: target.to_string(),
                    body: body.to_string(),
                }),
                _ => Err(ChatError::WhisperUsage),
            };
        }

        Ok(ClientCommand::Chat(line.to_string()))
    }
}
