//! Gemini Provider - Implementation of AIProvider for Google's Gemini API.
//!
//! Calls the `generateContent` REST endpoint. One HTTP attempt per call;
//! retries belong to [`RetryingAIProvider`](super::RetryingAIProvider).
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_model("gemini-2.0-flash")
//!     .with_temperature(0.2);
//!
//! let provider = GeminiProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ProviderInfo, TokenUsage,
};

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration shared by the Gemini chat and embedding adapters.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Generation model (e.g., "gemini-2.0-flash").
    pub model: String,
    /// Embedding model (e.g., "text-embedding-004").
    pub embedding_model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Sampling temperature applied when the request does not set one.
    pub temperature: f32,
}

impl GeminiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gemini-2.0-flash".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            temperature: 0.2,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Exposes the API key (for making requests).
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn timeout_secs(&self) -> u32 {
        self.timeout.as_secs() as u32
    }
}

/// Maps a non-success Gemini status to an [`AIError`].
pub(crate) fn error_for_status(status: u16, body: &str) -> AIError {
    match status {
        400 if body.contains("API_KEY_INVALID") => AIError::AuthenticationFailed,
        401 | 403 => AIError::AuthenticationFailed,
        429 => AIError::rate_limited(parse_retry_delay(body).unwrap_or(30)),
        400 | 404 => AIError::InvalidRequest(body.to_string()),
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, body)),
        _ => AIError::network(format!("Unexpected status {}: {}", status, body)),
    }
}

/// Extracts `"retryDelay": "12s"` from a quota error body.
fn parse_retry_delay(body: &str) -> Option<u32> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    parsed
        .pointer("/error/details")?
        .as_array()?
        .iter()
        .filter_map(|d| d.get("retryDelay").and_then(|v| v.as_str()))
        .find_map(|s| s.trim_end_matches('s').parse::<f64>().ok())
        .map(|secs| secs.ceil() as u32)
}

pub(crate) fn map_transport_error(err: reqwest::Error, timeout_secs: u32) -> AIError {
    if err.is_timeout() {
        AIError::Timeout { timeout_secs }
    } else if err.is_connect() {
        AIError::network(format!("Connection failed: {}", err))
    } else {
        AIError::network(err.to_string())
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider with the given configuration.
    ///
    /// # Errors
    ///
    /// - `Network` if the HTTP client cannot be built
    pub fn new(config: GeminiConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    /// Converts our request to Gemini's format.
    ///
    /// System-role messages are folded into the system instruction since
    /// Gemini contents only accept `user` and `model` roles.
    fn to_gemini_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let mut system_parts: Vec<GeminiPart> = request
            .system_prompt
            .iter()
            .map(|text| GeminiPart { text: text.clone() })
            .collect();
        let mut contents = Vec::new();

        for msg in &request.messages {
            match msg.role {
                MessageRole::System => system_parts.push(GeminiPart {
                    text: msg.content.clone(),
                }),
                MessageRole::User | MessageRole::Assistant => contents.push(GeminiContent {
                    role: Some(
                        if msg.role == MessageRole::User { "user" } else { "model" }.to_string(),
                    ),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }

        GeminiRequest {
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(GeminiContent {
                    role: None,
                    parts: system_parts,
                })
            },
            contents,
            generation_config: GenerationConfig {
                temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
                max_output_tokens: request.max_tokens,
            },
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        let body = self.to_gemini_request(request);

        self.client
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout_secs()))
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status.as_u16(), &body));
        }

        let gemini: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        completion_from(gemini, &self.config.model)
    }
}

/// Converts a decoded Gemini response into a completion.
fn completion_from(gemini: GeminiResponse, configured_model: &str) -> Result<CompletionResponse, AIError> {
    if let Some(reason) = gemini.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AIError::content_filtered(reason));
    }

    let candidate = gemini
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AIError::parse("No candidates in response"))?;

    let finish_reason = match candidate.finish_reason.as_deref() {
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    };

    let content: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if content.is_empty() && finish_reason == FinishReason::ContentFilter {
        return Err(AIError::content_filtered(
            candidate.finish_reason.unwrap_or_default(),
        ));
    }

    let usage = gemini
        .usage_metadata
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        usage,
        model: gemini
            .model_version
            .unwrap_or_else(|| configured_model.to_string()),
        finish_reason,
    })
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        tracing::debug!(
            model = %self.config.model,
            purpose = %request.metadata.purpose,
            messages = request.messages.len(),
            "Sending Gemini generateContent request"
        );
        let response = self.send_request(&request).await?;
        self.parse_response(response).await
    }

    fn provider_info(&self) -> ProviderInfo {
        let max_context = match self.config.model.as_str() {
            m if m.starts_with("gemini-1.5-pro") => 2_097_152,
            m if m.starts_with("gemini") => 1_048_576,
            _ => 32_768,
        };
        ProviderInfo::new("gemini", &self.config.model, max_context)
    }
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<PromptFeedback>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RequestMetadata;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(GeminiConfig::new("test-key")).unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = GeminiConfig::new("test-key")
            .with_model("gemini-1.5-pro")
            .with_embedding_model("embedding-001")
            .with_base_url("https://proxy.local/v1/")
            .with_timeout(Duration::from_secs(30))
            .with_temperature(0.5);

        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.embedding_model, "embedding-001");
        assert_eq!(config.base_url, "https://proxy.local/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn api_key_is_not_in_debug_output() {
        let config = GeminiConfig::new("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn request_maps_roles_and_system_instruction() {
        let request = CompletionRequest::new(RequestMetadata::new("test"))
            .with_system_prompt("You are a Scrum Master")
            .with_message(MessageRole::User, "first")
            .with_message(MessageRole::Assistant, "reply")
            .with_message(MessageRole::System, "extra rule")
            .with_message(MessageRole::User, "second");

        let body = serde_json::to_value(provider().to_gemini_request(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are a Scrum Master");
        assert_eq!(body["systemInstruction"]["parts"][1]["text"], "extra rule");
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "second");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn token_cap_becomes_max_output_tokens() {
        let request = CompletionRequest::new(RequestMetadata::new("test"))
            .with_message(MessageRole::User, "hello")
            .with_max_tokens(1024);

        let body = serde_json::to_value(provider().to_gemini_request(&request)).unwrap();
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn response_text_parts_are_concatenated() {
        let json = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "{\"status\":"}, {"text": " \"GENERAL_RESPONSE\"}"}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 8, "totalTokenCount": 20},
            "modelVersion": "gemini-2.0-flash-001"
        }"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        let completion = completion_from(response, "gemini-2.0-flash").unwrap();

        assert_eq!(completion.content, "{\"status\": \"GENERAL_RESPONSE\"}");
        assert_eq!(completion.usage.total_tokens, 20);
        assert_eq!(completion.model, "gemini-2.0-flash-001");
        assert_eq!(completion.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn blocked_prompt_is_content_filtered() {
        let json = r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = completion_from(response, "m").unwrap_err();
        assert!(matches!(err, AIError::ContentFiltered { .. }));
    }

    #[test]
    fn missing_candidates_is_parse_error() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(completion_from(response, "m"), Err(AIError::Parse(_))));
    }

    #[test]
    fn status_codes_map_to_errors() {
        assert!(matches!(error_for_status(401, ""), AIError::AuthenticationFailed));
        assert!(matches!(
            error_for_status(400, r#"{"error":{"status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#),
            AIError::AuthenticationFailed
        ));
        assert!(matches!(error_for_status(400, "bad"), AIError::InvalidRequest(_)));
        assert!(matches!(error_for_status(503, "overloaded"), AIError::Unavailable { .. }));
        assert!(matches!(
            error_for_status(429, "{}"),
            AIError::RateLimited { retry_after_secs: 30 }
        ));
    }

    #[test]
    fn rate_limit_uses_retry_delay_when_present() {
        let body = r#"{"error":{"code":429,"details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"7s"}]}}"#;
        assert!(matches!(
            error_for_status(429, body),
            AIError::RateLimited { retry_after_secs: 7 }
        ));
    }

    #[test]
    fn provider_info_reports_gemini() {
        let info = provider().provider_info();
        assert_eq!(info.name, "gemini");
        assert_eq!(info.model, "gemini-2.0-flash");
    }
}
