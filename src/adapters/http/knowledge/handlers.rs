//! HTTP handlers for knowledge base endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{handle_generation_error, handle_rejection};
use crate::application::KnowledgeService;

use super::dto::{
    AddContentRequest, AddContentResponse, HealthResponse, LearnFromResponseRequest,
    LearnFromResponseResponse,
};

#[derive(Clone)]
pub struct KnowledgeHandlers {
    knowledge: Arc<KnowledgeService>,
}

impl KnowledgeHandlers {
    pub fn new(knowledge: Arc<KnowledgeService>) -> Self {
        Self { knowledge }
    }
}

/// POST /knowledge/add - Add free text to the knowledge base
pub async fn add_content(
    State(handlers): State<KnowledgeHandlers>,
    payload: Result<Json<AddContentRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return handle_rejection(rejection),
    };

    match handlers
        .knowledge
        .add_content(&req.content, req.source_name.as_deref())
        .await
    {
        Ok(chunks_added) => {
            let response = AddContentResponse {
                message: format!(
                    "Content added to the knowledge base. {} chunks created.",
                    chunks_added
                ),
                chunks_added,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_generation_error(e),
    }
}

/// POST /knowledge/learn-from-response - Store a past answer as knowledge
pub async fn learn_from_response(
    State(handlers): State<KnowledgeHandlers>,
    payload: Result<Json<LearnFromResponseRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return handle_rejection(rejection),
    };

    match handlers
        .knowledge
        .learn_from_response(&req.session_id, req.response_index, req.save_as.as_deref())
        .await
    {
        Ok(learned) => {
            let response = LearnFromResponseResponse {
                message: format!(
                    "Response added to the knowledge base. {} chunks created.",
                    learned.chunks_added
                ),
                content: learned.content,
                file: learned.source,
                chunks_added: learned.chunks_added,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_generation_error(e),
    }
}

/// GET /health - Liveness plus knowledge base size
pub async fn health(State(handlers): State<KnowledgeHandlers>) -> Response {
    match handlers.knowledge.document_count().await {
        Ok(documents) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                documents,
            }),
        )
            .into_response(),
        Err(e) => handle_generation_error(e),
    }
}
