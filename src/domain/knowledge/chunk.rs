//! Knowledge chunk value objects.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ChunkId;

/// A piece of ingested text, ready to be embedded and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub text: String,
    /// Where the text came from: a file name, a named snippet or a learned turn.
    pub source: String,
}

impl DocumentChunk {
    /// Creates a chunk whose id is derived from its text.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: ChunkId::for_content(&text),
            text,
            source: source.into(),
        }
    }
}

/// A chunk returned from a similarity search, with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub source: String,
    /// Cosine similarity in `[-1.0, 1.0]`; higher is more relevant.
    pub score: f32,
}
