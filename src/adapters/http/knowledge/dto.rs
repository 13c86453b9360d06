//! Request and response bodies for the knowledge endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /knowledge/add`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddContentRequest {
    pub content: String,
    pub source_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddContentResponse {
    pub message: String,
    pub chunks_added: usize,
}

/// Body of `POST /knowledge/learn-from-response`.
#[derive(Debug, Clone, Deserialize)]
pub struct LearnFromResponseRequest {
    pub session_id: String,
    /// Negative values count from the most recent turn; defaults to -1.
    pub response_index: Option<i64>,
    pub save_as: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LearnFromResponseResponse {
    pub message: String,
    pub content: String,
    pub file: String,
    pub chunks_added: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub documents: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learn_request_defaults_optional_fields() {
        let req: LearnFromResponseRequest =
            serde_json::from_str(r#"{"session_id": "abc"}"#).unwrap();
        assert!(req.response_index.is_none());
        assert!(req.save_as.is_none());
    }

    #[test]
    fn add_content_requires_content() {
        assert!(serde_json::from_str::<AddContentRequest>(r#"{"source_name": "a.txt"}"#).is_err());
    }
}
