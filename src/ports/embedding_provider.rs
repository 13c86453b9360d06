//! Embedding Provider Port - Turns text into vectors for similarity search.

use async_trait::async_trait;

/// Port for text embedding models.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds documents for storage. Output order matches input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Name of the embedding model, for logs and health output.
    fn model_name(&self) -> &str;
}

/// Embedding provider errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("embedding request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    #[error("embedding authentication failed")]
    AuthenticationFailed,

    #[error("invalid embedding request: {0}")]
    InvalidRequest(String),

    #[error("failed to parse embedding response: {0}")]
    Parse(String),
}

impl EmbeddingError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EmbeddingError::Unavailable(_) | EmbeddingError::Timeout { .. }
        )
    }
}
