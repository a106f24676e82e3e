use super::{Embedding, EmbeddingProvider, EmbeddingSettings};
use crate::error::{KgError, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";

/// Request structure for OpenAI embeddings API
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    dimensions: usize,
}

/// Response structure from OpenAI embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Individual embedding data in API response
#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI embeddings client
///
/// Issues one blocking request per text. There is no retry or backoff here:
/// failures surface to the caller, which owns any retry policy.
pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    dimensions: usize,
    endpoint: String,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenAI API key
    /// * `model` - Model name (e.g., "text-embedding-3-small")
    /// * `settings` - Requested output dimensions; the seed is not used remotely
    pub fn new(api_key: String, model: String, settings: EmbeddingSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| KgError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model,
            dimensions: settings.dimensions,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Point the client at an OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, text: &'a str) -> EmbeddingRequest<'a> {
        EmbeddingRequest {
            model: &self.model,
            input: vec![text],
            dimensions: self.dimensions,
        }
    }
}

impl EmbeddingProvider for OpenAIEmbedder {
    fn embed(&self, normalized_text: &str) -> Result<Embedding> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(normalized_text))
            .send()
            .map_err(|e| KgError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(KgError::Embedding(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .map_err(|e| KgError::Embedding(format!("Failed to parse response: {}", e)))?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| KgError::Embedding("Empty response from OpenAI API".to_string()))?;

        if embedding.len() != self.dimensions {
            return Err(KgError::Embedding(format!(
                "Unexpected embedding dimension: expected {}, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        Ok(embedding)
    }
}
