//! Response envelope wrapping every generated artifact batch.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Epic, Requirement, TargetSchema, UserStory};
use crate::domain::foundation::Timestamp;

/// Outcome label the model attaches to each answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    #[serde(alias = "REQUERIMIENTOS_GENERADOS")]
    RequirementsGenerated,
    #[serde(alias = "EPICAS_GENERADAS")]
    EpicsGenerated,
    #[serde(alias = "HISTORIAS_GENERADAS")]
    StoriesGenerated,
    #[serde(alias = "INFORMACION_INSUFICIENTE")]
    InsufficientInformation,
    #[serde(alias = "ERROR_PROCESAMIENTO")]
    ProcessingError,
    #[serde(alias = "RESPUESTA_GENERAL")]
    GeneralResponse,
}

impl ResponseStatus {
    /// Parses a status label in either language; accents and case are ignored.
    pub fn parse_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| match c {
                'Á' | 'á' => 'A',
                'É' | 'é' => 'E',
                'Í' | 'í' => 'I',
                'Ó' | 'ó' => 'O',
                'Ú' | 'ú' => 'U',
                ' ' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        match normalized.as_str() {
            "REQUIREMENTS_GENERATED" | "REQUERIMIENTOS_GENERADOS" => {
                Some(ResponseStatus::RequirementsGenerated)
            }
            "EPICS_GENERATED" | "EPICAS_GENERADAS" => Some(ResponseStatus::EpicsGenerated),
            "STORIES_GENERATED" | "USER_STORIES_GENERATED" | "HISTORIAS_GENERADAS" => {
                Some(ResponseStatus::StoriesGenerated)
            }
            "INSUFFICIENT_INFORMATION" | "INFORMACION_INSUFICIENTE" => {
                Some(ResponseStatus::InsufficientInformation)
            }
            "PROCESSING_ERROR" | "ERROR_PROCESAMIENTO" => Some(ResponseStatus::ProcessingError),
            "GENERAL_RESPONSE" | "RESPUESTA_GENERAL" => Some(ResponseStatus::GeneralResponse),
            _ => None,
        }
    }

    /// The status that signals a successful batch for `schema`.
    pub fn generated_for(schema: TargetSchema) -> Self {
        match schema {
            TargetSchema::Requirements => ResponseStatus::RequirementsGenerated,
            TargetSchema::Epics => ResponseStatus::EpicsGenerated,
            TargetSchema::UserStories => ResponseStatus::StoriesGenerated,
        }
    }

    /// Returns true for statuses whose content is an artifact list.
    pub fn carries_artifacts(&self) -> bool {
        matches!(
            self,
            ResponseStatus::RequirementsGenerated
                | ResponseStatus::EpicsGenerated
                | ResponseStatus::StoriesGenerated
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::RequirementsGenerated => "REQUIREMENTS_GENERATED",
            ResponseStatus::EpicsGenerated => "EPICS_GENERATED",
            ResponseStatus::StoriesGenerated => "STORIES_GENERATED",
            ResponseStatus::InsufficientInformation => "INSUFFICIENT_INFORMATION",
            ResponseStatus::ProcessingError => "PROCESSING_ERROR",
            ResponseStatus::GeneralResponse => "GENERAL_RESPONSE",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated artifact batch, one variant per target schema.
///
/// Serialized as a bare list. Deserialization tries variants in order;
/// requirements are recognized by `category`, stories by `assigned_epic`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Artifacts {
    Requirements(Vec<Requirement>),
    UserStories(Vec<UserStory>),
    Epics(Vec<Epic>),
}

impl Artifacts {
    pub fn schema(&self) -> TargetSchema {
        match self {
            Artifacts::Requirements(_) => TargetSchema::Requirements,
            Artifacts::Epics(_) => TargetSchema::Epics,
            Artifacts::UserStories(_) => TargetSchema::UserStories,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Artifacts::Requirements(items) => items.len(),
            Artifacts::Epics(items) => items.len(),
            Artifacts::UserStories(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Envelope content: either artifacts or a free-text answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactContent {
    Artifacts(Artifacts),
    Text(String),
}

/// What the pipeline returns for every generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub status: ResponseStatus,
    pub query: String,
    pub timestamp: String,
    pub content: ArtifactContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_info: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ArtifactEnvelope {
    /// Builds an envelope around a validated batch.
    pub fn with_artifacts(query: impl Into<String>, artifacts: Artifacts) -> Self {
        Self {
            status: ResponseStatus::generated_for(artifacts.schema()),
            query: query.into(),
            timestamp: Timestamp::now().to_display_string(),
            content: ArtifactContent::Artifacts(artifacts),
            missing_info: None,
            metadata: None,
        }
    }

    /// Builds a textual envelope (insufficient information, general answer, error).
    pub fn with_text(
        status: ResponseStatus,
        query: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            status,
            query: query.into(),
            timestamp: Timestamp::now().to_display_string(),
            content: ArtifactContent::Text(text.into()),
            missing_info: None,
            metadata: None,
        }
    }

    /// The artifact batch, if the envelope carries one.
    pub fn artifacts(&self) -> Option<&Artifacts> {
        match &self.content {
            ArtifactContent::Artifacts(a) => Some(a),
            ArtifactContent::Text(_) => None,
        }
    }

    pub fn artifacts_mut(&mut self) -> Option<&mut Artifacts> {
        match &mut self.content {
            ArtifactContent::Artifacts(a) => Some(a),
            ArtifactContent::Text(_) => None,
        }
    }

    pub fn requirements(&self) -> &[Requirement] {
        match self.artifacts() {
            Some(Artifacts::Requirements(items)) => items,
            _ => &[],
        }
    }

    pub fn epics(&self) -> &[Epic] {
        match self.artifacts() {
            Some(Artifacts::Epics(items)) => items,
            _ => &[],
        }
    }

    pub fn user_stories(&self) -> &[UserStory] {
        match self.artifacts() {
            Some(Artifacts::UserStories(items)) => items,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifacts::{Priority, RequirementCategory};

    fn requirement() -> Requirement {
        Requirement {
            id: "REQ-001".to_string(),
            title: "Product Registration".to_string(),
            description: "Register products".to_string(),
            category: RequirementCategory::Functional,
            priority: Priority::High,
        }
    }

    #[test]
    fn status_serializes_in_english() {
        let json = serde_json::to_string(&ResponseStatus::StoriesGenerated).unwrap();
        assert_eq!(json, "\"STORIES_GENERATED\"");
    }

    #[test]
    fn status_deserializes_spanish_alias() {
        let status: ResponseStatus = serde_json::from_str("\"EPICAS_GENERADAS\"").unwrap();
        assert_eq!(status, ResponseStatus::EpicsGenerated);
    }

    #[test]
    fn parse_label_ignores_accents_and_case() {
        assert_eq!(
            ResponseStatus::parse_label("información insuficiente"),
            Some(ResponseStatus::InsufficientInformation)
        );
        assert_eq!(ResponseStatus::parse_label("done"), None);
    }

    #[test]
    fn envelope_with_artifacts_sets_matching_status() {
        let env = ArtifactEnvelope::with_artifacts("pos", Artifacts::Requirements(vec![requirement()]));
        assert_eq!(env.status, ResponseStatus::RequirementsGenerated);
        assert_eq!(env.requirements().len(), 1);
        assert!(env.epics().is_empty());
    }

    #[test]
    fn envelope_content_serializes_as_bare_list() {
        let env = ArtifactEnvelope::with_artifacts("pos", Artifacts::Requirements(vec![requirement()]));
        let json = serde_json::to_value(&env).unwrap();
        assert!(json["content"].is_array());
        assert_eq!(json["content"][0]["id"], "REQ-001");
        assert!(json.get("missing_info").is_none());
    }

    #[test]
    fn stored_envelopes_reload_with_the_same_variant() {
        let epic = Epic {
            id: "EPIC-001".to_string(),
            title: "Catalog".to_string(),
            description: "Product management".to_string(),
            related_requirements: vec![],
        };
        let env = ArtifactEnvelope::with_artifacts("q", Artifacts::Epics(vec![epic]));
        let json = serde_json::to_string(&env).unwrap();
        let back: ArtifactEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.epics().len(), 1);

        let text = ArtifactEnvelope::with_text(ResponseStatus::GeneralResponse, "hi", "hello");
        let json = serde_json::to_string(&text).unwrap();
        let back: ArtifactEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, ArtifactContent::Text("hello".to_string()));
    }
}
