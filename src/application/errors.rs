//! Application-level error taxonomy.
//!
//! Every failure a caller of the pipeline or knowledge service can observe
//! collapses into one of these variants. Lower-layer errors convert via
//! `From`, so handlers can use `?` throughout.

use thiserror::Error;

use crate::domain::foundation::ValidationError;
use crate::domain::generation::SchemaViolation;
use crate::domain::session::SessionError;
use crate::ports::{AIError, EmbeddingError, StoreError};

/// Errors surfaced by the generation pipeline and knowledge service.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Session id is unknown or not a valid id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Caller input is well-formed JSON but unusable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The model kept answering with output that fails validation.
    #[error(transparent)]
    SchemaViolation(#[from] SchemaViolation),

    /// The model or embedding service could not be reached.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The model or embedding service did not answer in time.
    #[error("upstream timed out after {timeout_secs}s")]
    UpstreamTimeout { timeout_secs: u32 },

    /// Storage or other local failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for GenerationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => GenerationError::SessionNotFound(id),
            SessionError::EmptyHistory(_) | SessionError::TurnIndexOutOfRange { .. } => {
                GenerationError::InvalidRequest(err.to_string())
            }
            SessionError::Storage(message) => GenerationError::Internal(message),
        }
    }
}

impl From<AIError> for GenerationError {
    fn from(err: AIError) -> Self {
        match err {
            AIError::Timeout { timeout_secs } => GenerationError::UpstreamTimeout { timeout_secs },
            AIError::InvalidRequest(message) => GenerationError::Internal(message),
            other => GenerationError::UpstreamUnavailable(other.to_string()),
        }
    }
}

impl From<EmbeddingError> for GenerationError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Timeout { timeout_secs } => {
                GenerationError::UpstreamTimeout { timeout_secs }
            }
            EmbeddingError::InvalidRequest(message) => GenerationError::Internal(message),
            other => GenerationError::UpstreamUnavailable(other.to_string()),
        }
    }
}

impl From<StoreError> for GenerationError {
    fn from(err: StoreError) -> Self {
        GenerationError::Internal(err.to_string())
    }
}

impl From<ValidationError> for GenerationError {
    fn from(err: ValidationError) -> Self {
        GenerationError::InvalidRequest(err.to_string())
    }
}
