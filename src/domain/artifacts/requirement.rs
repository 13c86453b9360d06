//! Requirement artifact and its enumerated fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// A single software requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: RequirementCategory,
    pub priority: Priority,
}

/// Functional vs non-functional split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum RequirementCategory {
    #[serde(rename = "Functional")]
    Functional,
    #[serde(rename = "Non-functional")]
    NonFunctional,
}

impl RequirementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementCategory::Functional => "Functional",
            RequirementCategory::NonFunctional => "Non-functional",
        }
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementCategory {
    type Err = ValidationError;

    /// Accepts English and Spanish labels in any case, with or without hyphen.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();

        match normalized.as_str() {
            "functional" | "funcional" | "f" => Ok(RequirementCategory::Functional),
            "nonfunctional" | "nofuncional" | "nf" => Ok(RequirementCategory::NonFunctional),
            _ => Err(ValidationError::invalid_format(
                "category",
                format!("unknown requirement category '{}'", s),
            )),
        }
    }
}

impl TryFrom<String> for RequirementCategory {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Priority shared by requirements and user stories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "baja" => Ok(Priority::Low),
            "medium" | "media" => Ok(Priority::Medium),
            "high" | "alta" => Ok(Priority::High),
            _ => Err(ValidationError::invalid_format(
                "priority",
                format!("unknown priority '{}'", s),
            )),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_accepts_spanish_and_english_labels() {
        assert_eq!("Funcional".parse::<RequirementCategory>().unwrap(), RequirementCategory::Functional);
        assert_eq!("No Funcional".parse::<RequirementCategory>().unwrap(), RequirementCategory::NonFunctional);
        assert_eq!("non-functional".parse::<RequirementCategory>().unwrap(), RequirementCategory::NonFunctional);
        assert_eq!("FUNCTIONAL".parse::<RequirementCategory>().unwrap(), RequirementCategory::Functional);
    }

    #[test]
    fn category_rejects_unknown_label() {
        assert!("Performance".parse::<RequirementCategory>().is_err());
    }

    #[test]
    fn priority_accepts_spanish_and_english_labels() {
        assert_eq!("Alta".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("media".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!(" Low ".parse::<Priority>().unwrap(), Priority::Low);
    }

    #[test]
    fn requirement_serializes_canonical_labels() {
        let req = Requirement {
            id: "REQ-NF-001".to_string(),
            title: "Availability".to_string(),
            description: "99.9% uptime".to_string(),
            category: RequirementCategory::NonFunctional,
            priority: Priority::High,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["category"], "Non-functional");
        assert_eq!(json["priority"], "High");
    }

    #[test]
    fn requirement_deserializes_spanish_labels() {
        let json = r#"{"id":"REQ-001","title":"Registro","description":"Registrar productos","category":"Funcional","priority":"Alta"}"#;
        let req: Requirement = serde_json::from_str(json).unwrap();
        assert_eq!(req.category, RequirementCategory::Functional);
        assert_eq!(req.priority, Priority::High);
    }
}
