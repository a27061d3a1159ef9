
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedding, EmbeddingService};
use crate::config::OpenAiConfig;
use crate::http::{HttpClient, ServiceError};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1536;

/// Client for the OpenAI `/v1/embeddings` endpoint
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    endpoint: String,
    model: String,
    http: HttpClient,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    #[inline]
    pub fn new(config: &OpenAiConfig, http: HttpClient) -> Self {
        Self {
            endpoint: format!("{}/v1/embeddings", config.base_url.trim_end_matches('/')),
            model: config.embedding_model.clone(),
            http,
        }
    }
}

impl EmbeddingService for OpenAiEmbedder {
    fn default_model(&self) -> &str {
        &self.model
    }

    fn embed_with_model(
        &self,
        text: &str,
        model: &str,
        api_key: &str,
    ) -> Result<Embedding, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::EmptyInput);
        }

        debug!(
            "Generating embedding with {} for text (length: {})",
            model,
            text.len()
        );

        let bearer = format!("Bearer {}", api_key);
        let request = EmbedRequest { model, input: text };
        let response: EmbedResponse =
            self.http
                .post_json(&self.endpoint, &[("Authorization", bearer.as_str())], &request)?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or(ServiceError::MissingField("data[0].embedding"))?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }
}
