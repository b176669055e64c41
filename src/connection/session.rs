// src/connection/session.rs

//! Defines the state associated with a single client session.

/// Holds the state specific to a single client session.
#[derive(Debug, Default)]
pub struct SessionState {
    /// The nickname registered on the first received frame. `None` until the
    /// registration phase completes; set exactly once.
    pub nickname: Option<String>,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Default::default()
    }
}
