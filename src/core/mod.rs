// src/core/mod.rs

//! The central module containing the core logic and data structures of linechat.

pub mod commands;
pub mod errors;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod state;

pub use commands::ClientCommand;
pub use errors::ChatError;
