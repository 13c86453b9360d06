//! Session repository port.
//!
//! Defines the contract for persisting and retrieving Session aggregates.
//! Callers serialize access per session; implementations only need to be
//! safe for concurrent use across different sessions.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::session::{Session, SessionError};

/// Repository port for Session aggregate persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or replace a session.
    ///
    /// # Errors
    ///
    /// - `Storage` on persistence failure
    async fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Find a session by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, SessionError>;

    /// Check if a session exists.
    async fn exists(&self, id: &SessionId) -> Result<bool, SessionError>;

    /// Delete a session. Returns false if it did not exist.
    async fn delete(&self, id: &SessionId) -> Result<bool, SessionError>;
}
