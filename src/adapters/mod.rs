//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Language model providers (Gemini, mock, retry wrapper)
//! - `embeddings` - Embedding models (Gemini, local hashing)
//! - `vector` - Document store implementations
//! - `storage` - Session repositories (YAML files, in-memory)
//! - `http` - REST API

pub mod ai;
pub mod embeddings;
pub mod http;
pub mod storage;
pub mod vector;
