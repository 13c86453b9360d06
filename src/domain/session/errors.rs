//! Session-specific error types.

use thiserror::Error;

use crate::domain::foundation::SessionId;

/// Errors raised while resolving, reading or mutating sessions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No session with this id exists. Holds the id as supplied by the caller.
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session {0} has no conversation history")]
    EmptyHistory(SessionId),

    #[error("Turn index {index} is out of range for a history of {len} turns")]
    TurnIndexOutOfRange { index: i64, len: usize },

    /// Backing store failure.
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl SessionError {
    pub fn not_found(id: impl Into<String>) -> Self {
        SessionError::NotFound(id.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        SessionError::Storage(message.into())
    }
}
