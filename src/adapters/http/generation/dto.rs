//! Request and response bodies for the generation endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::artifacts::{ArtifactEnvelope, Epic, Requirement};
use crate::domain::session::Turn;

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Empty or absent starts a new session.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Body of `POST /generate-epics`.
#[derive(Debug, Clone, Deserialize)]
pub struct EpicsRequest {
    pub requirements_description: RequirementsInput,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Requirements as clients send them: batches of lists, a flat list, or a
/// previous response envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequirementsInput {
    Batches(Vec<Vec<Requirement>>),
    List(Vec<Requirement>),
    Envelope { content: Vec<Requirement> },
}

impl RequirementsInput {
    pub fn into_requirements(self) -> Vec<Requirement> {
        match self {
            RequirementsInput::Batches(batches) => batches.into_iter().flatten().collect(),
            RequirementsInput::List(list) => list,
            RequirementsInput::Envelope { content } => content,
        }
    }
}

/// Body of `POST /generate-userstories`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserStoriesRequest {
    pub epic_description: EpicsInput,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Epics wrapped in an envelope-like object, or a bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EpicsInput {
    Envelope { content: Vec<Epic> },
    List(Vec<Epic>),
}

impl EpicsInput {
    pub fn into_epics(self) -> Vec<Epic> {
        match self {
            EpicsInput::Envelope { content } => content,
            EpicsInput::List(list) => list,
        }
    }
}

/// Response of every generation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResponse {
    pub session_id: String,
    pub message: ArtifactEnvelope,
}

/// Response of `GET /chat/history/:session_id`.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub history: Vec<Turn>,
}
