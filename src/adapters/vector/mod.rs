//! Document Store Adapters.
//!
//! - `InMemoryDocumentStore` - Brute-force cosine index with optional JSON snapshot

mod in_memory_store;

pub use in_memory_store::InMemoryDocumentStore;
