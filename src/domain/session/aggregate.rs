//! Session aggregate entity.
//!
//! A session is the conversational container for one user's work: an
//! append-only log of turns, each holding the request, the validated
//! envelope returned for it and the knowledge sources that grounded it.
//!
//! # Invariants
//!
//! - `id` is globally unique
//! - turn sequence numbers are contiguous from 0
//! - turns are never reordered, edited or removed

use serde::{Deserialize, Serialize};

use super::SessionError;
use crate::domain::artifacts::{ArtifactEnvelope, TargetSchema};
use crate::domain::foundation::{SessionId, Timestamp};

/// One request/response exchange within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Position in the session, starting at 0.
    pub sequence: u32,

    /// Which artifact kind was requested.
    pub schema: TargetSchema,

    /// The user message as it reached the pipeline.
    pub query: String,

    /// Validated result.
    pub envelope: ArtifactEnvelope,

    /// Sources of the chunks used as context, in rank order.
    #[serde(default)]
    pub sources: Vec<String>,

    pub timestamp: Timestamp,
}

impl Turn {
    /// The envelope as JSON text, the form fed back into prompts.
    pub fn response_text(&self) -> String {
        serde_json::to_string_pretty(&self.envelope).unwrap_or_default()
    }
}

/// Session aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    turns: Vec<Turn>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Create an empty session.
    pub fn new(id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// The last `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Looks up a turn by position; negative indexes count from the end.
    ///
    /// # Errors
    ///
    /// - `EmptyHistory` if the session has no turns
    /// - `TurnIndexOutOfRange` if the index falls outside the history
    pub fn turn_at(&self, index: i64) -> Result<&Turn, SessionError> {
        let len = self.turns.len();
        if len == 0 {
            return Err(SessionError::EmptyHistory(self.id));
        }

        let resolved = if index < 0 {
            len as i64 + index
        } else {
            index
        };

        if resolved < 0 || resolved >= len as i64 {
            return Err(SessionError::TurnIndexOutOfRange { index, len });
        }
        Ok(&self.turns[resolved as usize])
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Appends a turn at the end of the log and returns it.
    pub fn append_turn(
        &mut self,
        schema: TargetSchema,
        query: impl Into<String>,
        envelope: ArtifactEnvelope,
        sources: Vec<String>,
    ) -> &Turn {
        let now = Timestamp::now();
        let turn = Turn {
            sequence: self.turns.len() as u32,
            schema,
            query: query.into(),
            envelope,
            sources,
            timestamp: now,
        };
        self.turns.push(turn);
        self.updated_at = now;
        &self.turns[self.turns.len() - 1]
    }
}
