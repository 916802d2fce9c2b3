//! OpenAI-compatible embedding provider adapter.
//!
//! Talks to any server exposing `POST {base_url}/embeddings` with the OpenAI
//! request/response shape (OpenAI itself, Azure OpenAI, llama.cpp, vLLM).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::EmbeddingProvider;

/// Configuration for the OpenAI-compatible embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// API key. Falls back to `OPENAI_API_KEY`; local servers need none.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Expected embedding dimension; responses of another size are rejected.
    pub dimension: usize,
    pub timeout_secs: u64,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self::from(&EmbeddingConfig::default())
    }
}

impl From<&EmbeddingConfig> for OpenAiEmbeddingConfig {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
            timeout_secs: config.timeout_secs,
        }
    }
}

impl OpenAiEmbeddingConfig {
    fn api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

/// OpenAI-compatible embedding provider.
pub struct OpenAiEmbeddingProvider {
    config: OpenAiEmbeddingConfig,
    client: reqwest::Client,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: OpenAiEmbeddingConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::Validation(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    async fn call_embeddings_api(&self, texts: Vec<String>) -> DomainResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url);
        let request_body = EmbeddingsRequest {
            model: self.config.model.clone(),
            input: texts,
        };

        let mut request = self.client.post(&url).json(&request_body);
        if let Some(api_key) = self.config.api_key() {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            let message = format!("Embedding API returned {status}: {body}");
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                DomainError::TransientInfra(message)
            } else {
                DomainError::Validation(message)
            });
        }

        let result: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Serialization(format!("Failed to parse embedding response: {e}")))?;

        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let vector = self
            .call_embeddings_api(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::Serialization("Empty embedding response".to_string()))?;

        if vector.len() != self.config.dimension {
            return Err(DomainError::Validation(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.config.dimension,
                vector.len()
            )));
        }

        debug!(model = %self.config.model, dimension = vector.len(), "Embedded text");
        Ok(vector)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
