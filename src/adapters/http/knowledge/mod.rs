//! HTTP adapter for knowledge base maintenance.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AddContentRequest, AddContentResponse, HealthResponse, LearnFromResponseRequest,
    LearnFromResponseResponse,
};
pub use handlers::KnowledgeHandlers;
pub use routes::knowledge_routes;
