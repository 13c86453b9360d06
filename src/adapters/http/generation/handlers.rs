//! HTTP handlers for generation and history endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{handle_generation_error, handle_rejection};
use crate::application::{GenerationError, GenerationOutcome, GenerationPipeline, SessionManager};

use super::dto::{ChatRequest, EpicsRequest, GenerationResponse, HistoryResponse, UserStoriesRequest};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct GenerationHandlers {
    pipeline: Arc<GenerationPipeline>,
    sessions: Arc<SessionManager>,
}

impl GenerationHandlers {
    pub fn new(pipeline: Arc<GenerationPipeline>, sessions: Arc<SessionManager>) -> Self {
        Self { pipeline, sessions }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /chat - Generate requirements from a project description
pub async fn chat(
    State(handlers): State<GenerationHandlers>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return handle_rejection(rejection),
    };
    let session_id = req.session_id.unwrap_or_default();

    respond(handlers.pipeline.chat(&req.message, &session_id).await)
}

/// POST /generate-epics - Group requirements into epics
pub async fn generate_epics(
    State(handlers): State<GenerationHandlers>,
    payload: Result<Json<EpicsRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return handle_rejection(rejection),
    };
    let requirements = req.requirements_description.into_requirements();
    let session_id = req.session_id.unwrap_or_default();

    respond(handlers.pipeline.generate_epics(&requirements, &session_id).await)
}

/// POST /generate-userstories - Break epics into user stories
pub async fn generate_user_stories(
    State(handlers): State<GenerationHandlers>,
    payload: Result<Json<UserStoriesRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return handle_rejection(rejection),
    };
    let epics = req.epic_description.into_epics();
    let session_id = req.session_id.unwrap_or_default();

    respond(handlers.pipeline.generate_user_stories(&epics, &session_id).await)
}

/// GET /chat/history/:session_id - Turns recorded in a session
pub async fn get_history(
    State(handlers): State<GenerationHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    match handlers.sessions.history(&session_id).await {
        Ok(session) => {
            let response = HistoryResponse {
                session_id: session.id().to_string(),
                history: session.turns().to_vec(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_generation_error(e.into()),
    }
}

/// DELETE /chat/history/:session_id - Forget a session
pub async fn delete_history(
    State(handlers): State<GenerationHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    match handlers.sessions.delete(&session_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handle_generation_error(e.into()),
    }
}

fn respond(result: Result<GenerationOutcome, GenerationError>) -> Response {
    match result {
        Ok(outcome) => {
            let response = GenerationResponse {
                session_id: outcome.session_id.to_string(),
                message: outcome.envelope,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_generation_error(e),
    }
}
