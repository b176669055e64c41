// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug, Clone)]
pub enum ChatError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("line exceeds the maximum length of {0} bytes")]
    LineTooLong(usize),

    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    #[error("usage: /w <nickname> <message>")]
    WhisperUsage,

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

// --- From trait implementations for easy error conversion ---

// `std::io::Error` is not cloneable, so it is wrapped in an Arc to allow
// for cheap, shared cloning of the error value.
impl From<std::io::Error> for ChatError {
    fn from(e: std::io::Error) -> Self {
        ChatError::Io(Arc::new(e))
    }
}

impl From<std::string::FromUtf8Error> for ChatError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        ChatError::InvalidUtf8
    }
}

impl From<std::str::Utf8Error> for ChatError {
    fn from(_: std::str::Utf8Error) -> Self {
        ChatError::InvalidUtf8
    }
}
