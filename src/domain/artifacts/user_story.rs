//! User story artifact and narrative extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Priority;

/// A user-facing unit of work derived from an epic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStory {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assigned_epic: String,
    pub acceptance_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
}

static ENGLISH_NARRATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*as\s+an?\s+(?P<role>.+?),?\s+i\s+want\s+(?:to\s+)?(?P<goal>.+?),?\s+so\s+that\s+(?P<benefit>.+?)\.?\s*$")
        .expect("valid regex")
});

static SPANISH_NARRATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*como\s+(?:una?\s+)?(?P<role>.+?),?\s+quiero\s+(?P<goal>.+?),?\s+para\s+(?:que\s+)?(?P<benefit>.+?)\.?\s*$")
        .expect("valid regex")
});

/// Role, goal and benefit pulled out of a story sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub role: String,
    pub goal: String,
    pub benefit: String,
}

impl Narrative {
    /// Parses "As a X, I want Y so that Z" or "Como X, quiero Y para Z".
    pub fn parse(text: &str) -> Option<Self> {
        let caps = ENGLISH_NARRATIVE
            .captures(text)
            .or_else(|| SPANISH_NARRATIVE.captures(text))?;
        Some(Self {
            role: caps["role"].trim().to_string(),
            goal: caps["goal"].trim().to_string(),
            benefit: caps["benefit"].trim().to_string(),
        })
    }
}

impl UserStory {
    /// Fills role, goal and benefit from the description where the model left them out.
    pub fn fill_narrative(&mut self) {
        if self.role.is_some() && self.goal.is_some() && self.benefit.is_some() {
            return;
        }
        if let Some(narrative) = Narrative::parse(&self.description) {
            self.role.get_or_insert(narrative.role);
            self.goal.get_or_insert(narrative.goal);
            self.benefit.get_or_insert(narrative.benefit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(description: &str) -> UserStory {
        UserStory {
            id: "US-001".to_string(),
            title: "Register product".to_string(),
            description: description.to_string(),
            priority: Priority::High,
            assigned_epic: "EPIC-001".to_string(),
            acceptance_criteria: vec!["Product is saved".to_string()],
            role: None,
            goal: None,
            benefit: None,
        }
    }

    #[test]
    fn parses_english_narrative() {
        let n = Narrative::parse(
            "As a store manager, I want to register new products so that the catalog stays current.",
        )
        .unwrap();
        assert_eq!(n.role, "store manager");
        assert_eq!(n.goal, "register new products");
        assert_eq!(n.benefit, "the catalog stays current");
    }

    #[test]
    fn parses_spanish_narrative() {
        let n = Narrative::parse(
            "Como administrador de tienda, quiero registrar productos para mantener el catálogo actualizado",
        )
        .unwrap();
        assert_eq!(n.role, "administrador de tienda");
        assert_eq!(n.goal, "registrar productos");
        assert_eq!(n.benefit, "mantener el catálogo actualizado");
    }

    #[test]
    fn free_text_description_yields_no_narrative() {
        assert!(Narrative::parse("Register products in the catalog").is_none());
    }

    #[test]
    fn fill_narrative_keeps_model_supplied_fields() {
        let mut s = story("As a cashier, I want to scan items so that checkout is fast");
        s.role = Some("senior cashier".to_string());
        s.fill_narrative();
        assert_eq!(s.role.as_deref(), Some("senior cashier"));
        assert_eq!(s.goal.as_deref(), Some("scan items"));
        assert_eq!(s.benefit.as_deref(), Some("checkout is fast"));
    }

    #[test]
    fn narrative_fields_are_omitted_when_absent() {
        let json = serde_json::to_value(story("Register products")).unwrap();
        assert!(json.get("role").is_none());
        assert_eq!(json["priority"], "High");
    }
}
