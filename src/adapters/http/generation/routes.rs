//! HTTP routes for generation endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    chat, delete_history, generate_epics, generate_user_stories, get_history, GenerationHandlers,
};

/// Creates the generation router with all endpoints.
pub fn generation_routes(handlers: GenerationHandlers) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/generate-epics", post(generate_epics))
        .route("/generate-userstories", post(generate_user_stories))
        .route("/generate-user-stories", post(generate_user_stories))
        .route(
            "/chat/history/:session_id",
            get(get_history).delete(delete_history),
        )
        .with_state(handlers)
}
