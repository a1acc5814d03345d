//! TOML configuration parsing and validation.
//!
//! All tunables of the pipeline live here: chunking geometry, retrieval
//! depth, the context token budget, and the embedding/completion backends.
//! [`load_config`] parses and validates up front so bad parameters and
//! unknown model names fail before any document is touched.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::token;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_model_name")]
    pub model_name: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            model_name: default_model_name(),
        }
    }
}

fn default_max_tokens() -> usize {
    2000
}
fn default_model_name() -> String {
    "gpt-3.5-turbo".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    /// Desired answer length in words. Passed through to the prompt,
    /// not enforced.
    #[serde(default = "default_length_words")]
    pub length_words: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            length_words: default_length_words(),
        }
    }
}

fn default_length_words() -> usize {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dims")]
    pub dims: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dims: default_embedding_dims(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            api_base: default_api_base(),
        }
    }
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}
fn default_embedding_dims() -> usize {
    1536
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_api_base() -> String {
    "https://api.openai.com".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    /// Backend display name; must be a key of `backends`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Lookup table from backend display name to concrete model id.
    #[serde(default = "default_backends")]
    pub backends: BTreeMap<String, String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            backends: default_backends(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            api_base: default_api_base(),
        }
    }
}

fn default_backend() -> String {
    "GPT 01pro".to_string()
}

fn default_backends() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("GPT 01pro".to_string(), "gpt-4".to_string()),
        ("Claude Sonnet".to_string(), "claude-v1".to_string()),
        ("Gemini 1.5".to_string(), "gpt-3.5-turbo".to_string()),
    ])
}

fn default_temperature() -> f64 {
    0.7
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl CompletionConfig {
    /// Resolve the configured backend to its concrete model id.
    pub fn resolved_model(&self) -> Result<&str> {
        self.backends
            .get(&self.backend)
            .map(String::as_str)
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown completion backend '{}'; configured backends: {}",
                    self.backend,
                    self.backends
                        .keys()
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Load configuration from a TOML file, falling back to built-in defaults
/// when the file does not exist. Credentials are never read from the file;
/// they come from the environment (`OPENAI_API_KEY`).
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?
    } else {
        Config::default()
    };

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        return Err(Error::Config("chunking.chunk_size must be > 0".to_string()));
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        return Err(Error::Config(
            "chunking.chunk_overlap must be smaller than chunking.chunk_size".to_string(),
        ));
    }

    if config.retrieval.top_k == 0 {
        return Err(Error::Config("retrieval.top_k must be >= 1".to_string()));
    }

    if config.context.max_tokens == 0 {
        return Err(Error::Config("context.max_tokens must be > 0".to_string()));
    }
    // Fail fast on a model the estimator will not recognize at query time.
    token::estimate("", &config.context.model_name)
        .map_err(|e| Error::Config(format!("context.model_name: {}", e)))?;

    match config.embedding.provider.as_str() {
        "openai" | "disabled" => {}
        other => {
            return Err(Error::Config(format!(
                "unknown embedding provider '{}'; must be openai or disabled",
                other
            )))
        }
    }
    if config.embedding.is_enabled() && config.embedding.dims == 0 {
        return Err(Error::Config(format!(
            "embedding.dims must be > 0 when provider is '{}'",
            config.embedding.provider
        )));
    }

    config.completion.resolved_model()?;

    Ok(())
}
