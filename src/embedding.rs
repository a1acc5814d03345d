//! Embedding capability and implementations.
//!
//! The [`Embedder`] trait is the pipeline's only view of the embedding
//! service: a batch call that returns one fixed-dimension `f32` vector
//! per input text, in input order. The core never retries — transport
//! retry lives inside the provider, and exhausted retries surface as
//! [`Error::EmbeddingService`] to the ingestion or query caller.
//!
//! # Retry strategy (OpenAI provider)
//!
//! - HTTP 429 and 5xx → retry with exponential backoff (1s, 2s, 4s, …,
//!   capped at 2^5)
//! - other 4xx → fail immediately
//! - network errors → retry

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// Capability interface for turning text into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Model identifier (e.g. `"text-embedding-ada-002"`).
    fn model_name(&self) -> &str;

    /// Embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts, returning vectors in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text (e.g. a user question).
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_batch(&texts).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::EmbeddingService("empty embedding response".to_string()))
    }
}

/// Create the configured [`Embedder`].
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiEmbedder::new(config)?)),
        "disabled" => Ok(Box::new(DisabledEmbedder)),
        other => Err(Error::Config(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

/// A no-op embedder that always fails; used when embeddings are not
/// configured (e.g. chunking dry runs).
#[derive(Debug)]
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn dims(&self) -> usize {
        0
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::EmbeddingService(
            "embedding provider is disabled".to_string(),
        ))
    }
}

/// Embedding provider backed by the OpenAI embeddings API.
#[derive(Debug)]
pub struct OpenAiEmbedder {
    model: String,
    dims: usize,
    api_key: String,
    api_base: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    /// Create a provider reading `OPENAI_API_KEY` from the environment.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            Error::EmbeddingService("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::with_api_key(config, api_key)
    }

    /// Create a provider with an explicit API key.
    pub fn with_api_key(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::EmbeddingService(e.to_string()))?;

        Ok(Self {
            model: config.model.clone(),
            dims: config.dims,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.api_base);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| Error::EmbeddingService(e.to_string()))?;
                        return parse_embeddings_response(&json, texts.len());
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(attempt, %status, "embeddings request failed, will retry");
                        last_err = Some(Error::EmbeddingService(format!(
                            "API error {}: {}",
                            status, body_text
                        )));
                        continue;
                    }

                    return Err(Error::EmbeddingService(format!(
                        "API error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    warn!(attempt, error = %e, "embeddings request failed, will retry");
                    last_err = Some(Error::EmbeddingService(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| Error::EmbeddingService("embedding failed after retries".into())))
    }
}

/// Extract the `data[].embedding` arrays, in input order.
fn parse_embeddings_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| Error::EmbeddingService("invalid response: missing data array".into()))?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| Error::EmbeddingService("invalid response: missing embedding".into()))?;

        let vector: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        embeddings.push(vector);
    }

    if embeddings.len() != expected {
        return Err(Error::EmbeddingService(format!(
            "response contained {} embeddings for {} inputs",
            embeddings.len(),
            expected
        )));
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_response() {
        let json = serde_json::json!({
            "data": [
                { "embedding": [0.1, 0.2, 0.3] },
                { "embedding": [0.4, 0.5, 0.6] },
            ]
        });
        let vectors = parse_embeddings_response(&json, 2).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), 3);
        assert!((vectors[1][0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_parse_missing_data_fails() {
        let json = serde_json::json!({ "error": "nope" });
        assert!(parse_embeddings_response(&json, 1).is_err());
    }

    #[test]
    fn test_parse_count_mismatch_fails() {
        let json = serde_json::json!({
            "data": [ { "embedding": [0.1] } ]
        });
        let err = parse_embeddings_response(&json, 2).unwrap_err();
        assert!(matches!(err, Error::EmbeddingService(_)));
    }

    #[tokio::test]
    async fn test_disabled_embedder_fails() {
        let embedder = DisabledEmbedder;
        let err = embedder
            .embed_batch(&["hello".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingService(_)));
    }

    #[test]
    fn test_create_embedder_rejects_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "sentencepiece".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(matches!(
            create_embedder(&config).unwrap_err(),
            Error::Config(_)
        ));
    }
}
