//! Epic artifact.

use serde::{Deserialize, Serialize};

/// A large body of work grouping related requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub related_requirements: Vec<RelatedRequirement>,
}

/// Reference from an epic back to one of the requirements it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedRequirement {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Epic {
    /// Returns true if any requirement reference points at `requirement_id`.
    pub fn covers(&self, requirement_id: &str) -> bool {
        self.related_requirements
            .iter()
            .any(|r| r.id.eq_ignore_ascii_case(requirement_id))
    }
}
