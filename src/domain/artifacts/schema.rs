//! Target schema and content language selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which artifact collection a generation call must produce.
///
/// Chosen by the endpoint that was invoked and passed explicitly to both
/// the prompt composer and the response parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSchema {
    /// Functional and non-functional requirements from a project description.
    Requirements,
    /// Epics summarizing a batch of requirements.
    Epics,
    /// User stories broken out of epics.
    UserStories,
}

impl TargetSchema {
    /// Canonical id prefix for artifacts of this schema.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            TargetSchema::Requirements => "REQ",
            TargetSchema::Epics => "EPIC",
            TargetSchema::UserStories => "US",
        }
    }

    /// Human-readable plural name, used in prompts and log lines.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            TargetSchema::Requirements => "requirements",
            TargetSchema::Epics => "epics",
            TargetSchema::UserStories => "user stories",
        }
    }
}

impl fmt::Display for TargetSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetSchema::Requirements => "requirements",
            TargetSchema::Epics => "epics",
            TargetSchema::UserStories => "user_stories",
        };
        write!(f, "{}", s)
    }
}

/// Language the artifacts are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
}

const SPANISH_MARKERS: &[&str] = &[
    "el", "la", "los", "las", "de", "del", "que", "para", "con", "una", "un", "por", "como",
    "quiero", "debe", "sistema", "tienda", "usuarios", "ventas", "gestión", "proyecto", "es",
    "y", "en", "sucursales", "inventario", "permitir",
];

const ENGLISH_MARKERS: &[&str] = &[
    "the", "and", "of", "to", "with", "for", "a", "an", "system", "should", "as", "want",
    "so", "that", "is", "in", "store", "users", "sales", "management", "project", "allow",
    "branch", "inventory",
];

impl Language {
    /// Infers the language of free text.
    ///
    /// Counts common function words and Spanish-only characters; ties and
    /// empty input fall back to English.
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        let mut spanish = lower
            .chars()
            .filter(|c| matches!(c, 'ñ' | '¿' | '¡' | 'á' | 'é' | 'í' | 'ó' | 'ú'))
            .count();
        let mut english = 0usize;

        for word in lower.split(|c: char| !c.is_alphanumeric() && c != 'ñ') {
            if word.is_empty() {
                continue;
            }
            if SPANISH_MARKERS.contains(&word) {
                spanish += 1;
            }
            if ENGLISH_MARKERS.contains(&word) {
                english += 1;
            }
        }

        if spanish > english {
            Language::Spanish
        } else {
            Language::English
        }
    }

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_spanish_project_description() {
        let text = "Sistema de punto de venta para una tienda con varias sucursales y control de inventario";
        assert_eq!(Language::detect(text), Language::Spanish);
    }

    #[test]
    fn detects_english_project_description() {
        let text = "Point-of-sale system for a multi-branch store with inventory tracking";
        assert_eq!(Language::detect(text), Language::English);
    }

    #[test]
    fn accents_tip_the_balance_to_spanish() {
        assert_eq!(Language::detect("gestión de catálogo"), Language::Spanish);
    }

    #[test]
    fn empty_text_defaults_to_english() {
        assert_eq!(Language::detect(""), Language::English);
        assert_eq!(Language::detect("   "), Language::English);
    }

    #[test]
    fn schema_prefixes_match_artifact_ids() {
        assert_eq!(TargetSchema::Requirements.id_prefix(), "REQ");
        assert_eq!(TargetSchema::Epics.id_prefix(), "EPIC");
        assert_eq!(TargetSchema::UserStories.id_prefix(), "US");
    }

    #[test]
    fn schema_serializes_snake_case() {
        let json = serde_json::to_string(&TargetSchema::UserStories).unwrap();
        assert_eq!(json, "\"user_stories\"");
    }
}
