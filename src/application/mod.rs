//! Application layer - Use cases orchestrating domain logic and ports.
//!
//! - `GenerationPipeline` - chat, epic and user-story generation
//! - `KnowledgeService` - knowledge base ingestion and learning from answers
//! - `SessionManager` - session resolution with per-session locking
//! - `Retriever` - similarity search over the knowledge base

mod errors;
mod knowledge;
mod pipeline;
mod retriever;
mod session_manager;

pub use errors::GenerationError;
pub use knowledge::{IngestReport, KnowledgeService, LearnedResponse};
pub use pipeline::{GenerationOutcome, GenerationPipeline, PipelineSettings};
pub use retriever::Retriever;
pub use session_manager::{LockedSession, SessionManager};
