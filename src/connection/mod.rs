// src/connection/mod.rs

//! Manages the lifecycle of a single client connection: line framing,
//! nickname registration, command routing, and cleanup.

mod guard;
mod handler;
mod session;

pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
pub use session::SessionState;
