//! Completion capability and implementations.
//!
//! The pipeline hands a fully assembled prompt to a [`Completion`]
//! backend and treats the generated text as opaque — nothing downstream
//! parses it. Backend display names resolve to concrete model ids
//! through the configuration lookup table, which is validated at load
//! time so an unknown name never reaches this module.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::config::CompletionConfig;
use crate::error::{Error, Result};

/// Capability interface for prompt → generated text.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Model identifier the backend will invoke.
    fn model_name(&self) -> &str;

    /// Generate text for the given prompt, returned verbatim.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Create the configured [`Completion`] backend.
pub fn create_completion(config: &CompletionConfig) -> Result<Box<dyn Completion>> {
    Ok(Box::new(OpenAiCompletion::new(config)?))
}

/// Completion backend using the OpenAI chat completions API.
#[derive(Debug)]
pub struct OpenAiCompletion {
    model: String,
    temperature: f64,
    api_key: String,
    api_base: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiCompletion {
    /// Create a backend reading `OPENAI_API_KEY` from the environment.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            Error::CompletionService("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::with_api_key(config, api_key)
    }

    /// Create a backend with an explicit API key.
    pub fn with_api_key(config: &CompletionConfig, api_key: String) -> Result<Self> {
        let model = config.resolved_model()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::CompletionService(e.to_string()))?;

        Ok(Self {
            model,
            temperature: config.temperature,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl Completion for OpenAiCompletion {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.api_base);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [ { "role": "user", "content": prompt } ],
            "temperature": self.temperature,
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
                            .map_err(|e| Error::CompletionService(e.to_string()))?;
                        return parse_completion_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(attempt, %status, "completion request failed, will retry");
                        last_err = Some(Error::CompletionService(format!(
                            "API error {}: {}",
                            status, body_text
                        )));
                        continue;
                    }

                    return Err(Error::CompletionService(format!(
                        "API error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    warn!(attempt, error = %e, "completion request failed, will retry");
                    last_err = Some(Error::CompletionService(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| Error::CompletionService("completion failed after retries".into())))
    }
}

/// Extract `choices[0].message.content` from a chat completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
        .ok_or_else(|| Error::CompletionService("invalid response: missing message content".into()))
}
