//! Document Store Port - Vector index over embedded knowledge chunks.
//!
//! # Design
//!
//! - **Append-only**: chunks are added, never edited
//! - **Content-addressed**: adding a chunk whose id is already stored is a no-op
//! - **Ranked reads**: search returns chunks by descending similarity

use async_trait::async_trait;

use crate::domain::knowledge::{DocumentChunk, RetrievedChunk};

/// A chunk paired with its embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: DocumentChunk,
    pub vector: Vec<f32>,
}

/// Port for the vector index.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Adds chunks, skipping ids already present. Returns how many were added.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if a vector's length differs from stored vectors
    /// - `Io` / `Serialization` if a persistent snapshot cannot be written
    async fn add(&self, chunks: Vec<EmbeddedChunk>) -> Result<usize, StoreError>;

    /// Returns up to `k` chunks ranked by descending similarity to `query`.
    ///
    /// An empty store or `k == 0` yields an empty list.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>, StoreError>;

    /// Number of stored chunks.
    async fn len(&self) -> Result<usize, StoreError>;
}

/// Document store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("store I/O error: {0}")]
    Io(String),

    #[error("store serialization error: {0}")]
    Serialization(String),
}
