//! HTTP routes for knowledge endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{add_content, health, learn_from_response, KnowledgeHandlers};

/// Creates the knowledge router, including the health check.
pub fn knowledge_routes(handlers: KnowledgeHandlers) -> Router {
    Router::new()
        .route("/knowledge/add", post(add_content))
        .route("/knowledge/learn-from-response", post(learn_from_response))
        .route("/health", get(health))
        .with_state(handlers)
}
