//! Error responses shared by every HTTP adapter.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::GenerationError;

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self::new("NOT_FOUND", format!("{} not found: {}", resource_type, id))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

/// Maps an application error to its HTTP response.
///
/// Upstream and storage details are logged here and replaced by a generic
/// message in the body.
pub fn handle_generation_error(error: GenerationError) -> Response {
    match error {
        GenerationError::SessionNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found("Session", &id)),
        )
            .into_response(),
        GenerationError::InvalidRequest(message) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(message)),
        )
            .into_response(),
        GenerationError::SchemaViolation(violation) => {
            tracing::warn!(schema = %violation.schema, reason = %violation.reason, "Returning schema violation");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("SCHEMA_VIOLATION", violation.to_string())),
            )
                .into_response()
        }
        GenerationError::UpstreamUnavailable(detail) => {
            tracing::error!(%detail, "Language model unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(
                    "UPSTREAM_UNAVAILABLE",
                    "The language model is temporarily unavailable",
                )),
            )
                .into_response()
        }
        GenerationError::UpstreamTimeout { timeout_secs } => {
            tracing::error!(timeout_secs, "Language model timed out");
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(ErrorResponse::new(
                    "UPSTREAM_TIMEOUT",
                    "The language model did not answer in time",
                )),
            )
                .into_response()
        }
        GenerationError::Internal(detail) => {
            tracing::error!(%detail, "Internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Internal server error")),
            )
                .into_response()
        }
    }
}

/// Maps a body that failed to parse to a 400 response.
pub fn handle_rejection(rejection: JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::bad_request(rejection.body_text())),
    )
        .into_response()
}
