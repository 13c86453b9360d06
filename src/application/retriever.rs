//! Similarity retrieval over the knowledge store.

use std::sync::Arc;

use super::GenerationError;
use crate::domain::knowledge::RetrievedChunk;
use crate::ports::{DocumentStore, EmbeddingProvider};

/// Embeds a query and returns the closest stored chunks.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn DocumentStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { embedder, store }
    }

    /// Up to `k` chunks ranked by descending similarity.
    ///
    /// An empty store or `k == 0` returns an empty list without calling the
    /// embedding model.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, GenerationError> {
        if k == 0 || self.store.len().await? == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed_query(query).await?;
        let chunks = self.store.search(&vector, k).await?;

        tracing::debug!(
            requested = k,
            returned = chunks.len(),
            top_score = chunks.first().map(|c| c.score),
            "Retrieved knowledge chunks"
        );
        Ok(chunks)
    }
}
