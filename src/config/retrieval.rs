//! Retrieval and knowledge base configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Retrieval configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks retrieved per request
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Target chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Past turns included in each prompt
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,

    /// Directory of `.txt`, `.md` and `.pdf` files ingested at startup
    #[serde(default = "default_knowledge_dir")]
    pub knowledge_dir: PathBuf,

    /// Only ingest these subdirectories of `knowledge_dir` (comma-separated)
    pub knowledge_subdirs: Option<String>,

    /// JSON snapshot of the vector store; in-memory only when unset
    pub store_path: Option<PathBuf>,

    /// Rewrite follow-up messages into standalone questions before retrieval
    #[serde(default)]
    pub contextualize_queries: bool,

    /// Use the local hashing embedder instead of the hosted model
    #[serde(default)]
    pub use_local_embeddings: bool,
}

impl RetrievalConfig {
    /// Subdirectory filter as a list; empty means the top level of `knowledge_dir`
    pub fn knowledge_subdirs_list(&self) -> Vec<String> {
        self.knowledge_subdirs
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validate retrieval configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.chunk_size == 0 {
            return Err(ValidationError::InvalidChunking("chunk_size must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ValidationError::InvalidChunking(
                "chunk_overlap must be smaller than chunk_size",
            ));
        }
        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_history_turns: default_max_history_turns(),
            knowledge_dir: default_knowledge_dir(),
            knowledge_subdirs: None,
            store_path: None,
            contextualize_queries: false,
            use_local_embeddings: false,
        }
    }
}

fn default_top_k() -> usize {
    5
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_max_history_turns() -> usize {
    10
}

fn default_knowledge_dir() -> PathBuf {
    PathBuf::from("./data/knowledge")
}
