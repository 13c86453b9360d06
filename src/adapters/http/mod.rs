//! HTTP adapters - REST API implementations.
//!
//! Each endpoint group has its own adapter; `router` assembles them and
//! applies tracing, request ids, CORS and the request timeout.

mod error;
pub mod generation;
pub mod knowledge;
mod router;

// Re-export key types for convenience
pub use error::{handle_generation_error, ErrorResponse};
pub use generation::{generation_routes, GenerationHandlers};
pub use knowledge::{knowledge_routes, KnowledgeHandlers};
pub use router::{app_router, RouterSettings};
