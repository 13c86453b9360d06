//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Hosted language model
//! - `EmbeddingProvider` - Text embedding model
//! - `DocumentStore` - Vector index over knowledge chunks
//! - `SessionRepository` - Session persistence

mod ai_provider;
mod document_store;
mod embedding_provider;
mod session_repository;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use document_store::{DocumentStore, EmbeddedChunk, StoreError};
pub use embedding_provider::{EmbeddingError, EmbeddingProvider};
pub use session_repository::SessionRepository;
