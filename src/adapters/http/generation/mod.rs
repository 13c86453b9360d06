//! HTTP adapter for artifact generation and session history.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ChatRequest, EpicsInput, EpicsRequest, GenerationResponse, HistoryResponse,
    RequirementsInput, UserStoriesRequest,
};
pub use handlers::GenerationHandlers;
pub use routes::generation_routes;
