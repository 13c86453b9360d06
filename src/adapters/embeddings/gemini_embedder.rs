//! Gemini embedding adapter (`embedContent` / `batchEmbedContents`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::adapters::ai::{error_for_status, map_transport_error, GeminiConfig};
use crate::ports::{AIError, EmbeddingError, EmbeddingProvider};

/// Embeds text with a hosted Gemini embedding model.
pub struct GeminiEmbedder {
    config: GeminiConfig,
    client: Client,
}

impl GeminiEmbedder {
    /// # Errors
    ///
    /// - `InvalidRequest` if the HTTP client cannot be built
    pub fn new(config: GeminiConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn model_path(&self) -> String {
        format!("models/{}", self.config.embedding_model)
    }

    fn request_for(&self, text: &str, task_type: &'static str) -> EmbedRequest {
        EmbedRequest {
            model: self.model_path(),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_string(),
                }],
            },
            task_type,
        }
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R, EmbeddingError> {
        let url = format!("{}/{}:{}", self.config.base_url, self.model_path(), method);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.config.api_key())
            .json(body)
            .send()
            .await
            .map_err(|e| embedding_error(map_transport_error(e, self.config.timeout_secs())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(embedding_error(error_for_status(status.as_u16(), &body)));
        }

        response
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(e.to_string()))
    }
}

fn embedding_error(err: AIError) -> EmbeddingError {
    match err {
        AIError::AuthenticationFailed => EmbeddingError::AuthenticationFailed,
        AIError::Timeout { timeout_secs } => EmbeddingError::Timeout { timeout_secs },
        AIError::InvalidRequest(msg) => EmbeddingError::InvalidRequest(msg),
        AIError::Parse(msg) => EmbeddingError::Parse(msg),
        other => EmbeddingError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| self.request_for(t, "RETRIEVAL_DOCUMENT"))
                .collect(),
        };
        let response: BatchEmbedResponse = self.post("batchEmbedContents", &body).await?;

        if response.embeddings.len() != texts.len() {
            return Err(EmbeddingError::Parse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = self.request_for(text, "RETRIEVAL_QUERY");
        let response: SingleEmbedResponse = self.post("embedContent", &body).await?;
        Ok(response.embedding.values)
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}

// ----- Gemini Embedding API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest {
    model: String,
    content: EmbedContent,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Debug, Serialize)]
struct EmbedPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct SingleEmbedResponse {
    embedding: EmbeddingValues,
}
