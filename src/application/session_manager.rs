//! Session resolution and per-session serialization.
//!
//! Requests for the same session are serialized through an async mutex held
//! from resolution until the new turn is persisted, so concurrent requests
//! never interleave turn writes. Different sessions proceed in parallel.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

use crate::domain::artifacts::{ArtifactEnvelope, TargetSchema};
use crate::domain::foundation::SessionId;
use crate::domain::session::{Session, SessionError};
use crate::ports::SessionRepository;

type LockTable = HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>;

/// A session loaded under its lock. The lock is released on drop.
#[derive(Debug)]
pub struct LockedSession {
    session: Session,
    _guard: OwnedMutexGuard<()>,
}

impl LockedSession {
    pub fn into_session(self) -> Session {
        self.session
    }
}

impl Deref for LockedSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl DerefMut for LockedSession {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

/// Creates, loads and persists sessions.
pub struct SessionManager {
    repository: Arc<dyn SessionRepository>,
    locks: Mutex<LockTable>,
}

impl SessionManager {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            repository,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves the session a request refers to and locks it.
    ///
    /// An empty (or blank) id starts a new session with a fresh id. Any
    /// other id must parse as a UUID and name a stored session.
    ///
    /// # Errors
    ///
    /// - `NotFound` for malformed or unknown ids
    /// - `Storage` if the repository fails
    pub async fn resolve_session(&self, session_id: &str) -> Result<LockedSession, SessionError> {
        let raw = session_id.trim();

        if raw.is_empty() {
            let id = self.fresh_id().await?;
            let guard = self.lock(&id).await;
            tracing::info!(session_id = %id, "Started new session");
            return Ok(LockedSession {
                session: Session::new(id),
                _guard: guard,
            });
        }

        let id = parse_id(raw)?;
        let guard = self.lock(&id).await;
        let session = self
            .repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| SessionError::not_found(raw))?;

        Ok(LockedSession {
            session,
            _guard: guard,
        })
    }

    /// Appends a turn and persists the session.
    pub async fn append_turn(
        &self,
        session: &mut Session,
        schema: TargetSchema,
        message: &str,
        envelope: ArtifactEnvelope,
        sources: Vec<String>,
    ) -> Result<(), SessionError> {
        let sequence = session.append_turn(schema, message, envelope, sources).sequence;
        self.repository.save(session).await?;
        tracing::debug!(session_id = %session.id(), sequence, %schema, "Recorded turn");
        Ok(())
    }

    /// Loads a session for reading without creating one.
    pub async fn history(&self, session_id: &str) -> Result<Session, SessionError> {
        let id = parse_id(session_id.trim())?;
        self.repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| SessionError::not_found(session_id))
    }

    /// Deletes a session and its history.
    pub async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        let id = parse_id(session_id.trim())?;
        let _guard = self.lock(&id).await;
        if !self.repository.delete(&id).await? {
            return Err(SessionError::not_found(session_id));
        }
        tracing::info!(session_id = %id, "Deleted session");
        Ok(())
    }

    /// Acquires the per-session lock.
    pub async fn lock(&self, id: &SessionId) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on can go.
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            locks.entry(*id).or_default().clone()
        };
        mutex.lock_owned().await
    }

    async fn fresh_id(&self) -> Result<SessionId, SessionError> {
        loop {
            let id = SessionId::new();
            if !self.repository.exists(&id).await? {
                return Ok(id);
            }
        }
    }
}

fn parse_id(raw: &str) -> Result<SessionId, SessionError> {
    SessionId::from_str(raw).map_err(|_| SessionError::not_found(raw))
}
