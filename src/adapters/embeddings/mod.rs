//! Embedding Provider Adapters.
//!
//! - `GeminiEmbedder` - Hosted Gemini embedding model
//! - `HashingEmbedder` - Deterministic local embedder for tests and offline use

mod gemini_embedder;
mod hashing_embedder;

pub use gemini_embedder::GeminiEmbedder;
pub use hashing_embedder::{HashingEmbedder, DEFAULT_HASHING_DIMENSIONS};
