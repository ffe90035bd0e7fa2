//! TOML-based configuration for pkm-recall
//!
//! All settings live in `recall.toml`. Every field has a default, so an empty
//! file (or no file, via [`RecallConfig::load_or_default`]) is a working
//! development setup: mock embeddings, in-memory index, five-minute cache.
//!
//! Secrets never appear in the file. Sections name the environment variable
//! that holds a credential (`api_key_env`) and it is resolved at runtime.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::rag::cache::CacheConfig;

/// Root configuration structure loaded from recall.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecallConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub completion: CompletionConfig,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ============= Embedding Configuration =============

/// How the embedding backend is chosen at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Live only with a real credential in a production environment.
    #[default]
    Auto,
    /// Always the deterministic offline embedder.
    Mock,
    /// Always the remote backend; a missing credential is an error.
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub mode: EmbeddingMode,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible embeddings API.
    #[serde(default = "default_embedding_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_embedding_api_key_env")]
    pub api_key_env: String,

    /// Environment variable naming the deployment environment.
    #[serde(default = "default_environment_env")]
    pub environment_env: String,

    /// Dimensionality reported by the live backend.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_environment_env() -> String {
    "RECALL_ENV".to_string()
}

fn default_dimensions() -> usize {
    1536
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::default(),
            model: default_embedding_model(),
            api_base: default_embedding_api_base(),
            api_key_env: default_embedding_api_key_env(),
            environment_env: default_environment_env(),
            dimensions: default_dimensions(),
        }
    }
}

// ============= Index Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexProvider {
    /// In-process linear scan.
    #[default]
    Memory,
    /// Pinecone REST data plane.
    Pinecone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub provider: IndexProvider,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Seed the in-memory store with example documents on its first query.
    #[serde(default)]
    pub seed_examples: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinecone: Option<PineconeConfig>,
}

fn default_top_k() -> usize {
    5
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: IndexProvider::default(),
            top_k: default_top_k(),
            seed_examples: false,
            pinecone: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    /// Index host, e.g. `https://notes-abc123.svc.us-east1-gcp.pinecone.io`.
    pub host: String,

    #[serde(default = "default_pinecone_api_key_env")]
    pub api_key_env: String,
}

fn default_pinecone_api_key_env() -> String {
    "PINECONE_API_KEY".to_string()
}

// ============= Context Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,

    /// Chunk length used at ingestion time.
    #[serde(default = "default_max_chunk_length")]
    pub max_chunk_length: usize,
}

fn default_max_context_tokens() -> usize {
    4000
}

fn default_chars_per_token() -> usize {
    4
}

fn default_max_chunk_length() -> usize {
    crate::rag::chunker::DEFAULT_MAX_CHUNK_LENGTH
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
            chars_per_token: default_chars_per_token(),
            max_chunk_length: default_max_chunk_length(),
        }
    }
}

// ============= Completion Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_completion_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl RecallConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Like [`RecallConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RecallConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "index.top_k must be at least 1".into(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions must be at least 1".into(),
            ));
        }
        if self.cache.trim_count == 0 {
            return Err(ConfigError::ValidationError(
                "cache.trim_count must be at least 1".into(),
            ));
        }
        if self.cache.trim_count > self.cache.max_entries {
            return Err(ConfigError::ValidationError(format!(
                "cache.trim_count ({}) cannot exceed cache.max_entries ({})",
                self.cache.trim_count, self.cache.max_entries
            )));
        }
        if self.context.chars_per_token == 0 {
            return Err(ConfigError::ValidationError(
                "context.chars_per_token must be at least 1".into(),
            ));
        }
        if self.context.max_chunk_length == 0 || self.context.max_context_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_chunk_length and context.max_context_tokens must be positive".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "completion.temperature must be within 0.0..=2.0, got {}",
                self.completion.temperature
            )));
        }
        if self.index.provider == IndexProvider::Pinecone {
            match &self.index.pinecone {
                Some(p) if !p.host.trim().is_empty() => {}
                _ => {
                    return Err(ConfigError::ValidationError(
                        "index.provider = \"pinecone\" requires [index.pinecone] with a host"
                            .into(),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// The embedding API key, if its variable is set.
    pub fn embedding_api_key(&self) -> Option<String> {
        self.resolve_env(&self.embedding.api_key_env)
    }

    /// The deployment environment name, if its variable is set.
    pub fn environment(&self) -> Option<String> {
        self.resolve_env(&self.embedding.environment_env)
    }

    /// The Pinecone API key from the environment
    pub fn pinecone_api_key(&self) -> Result<String, ConfigError> {
        let env_name = self
            .index
            .pinecone
            .as_ref()
            .map(|p| p.api_key_env.clone())
            .unwrap_or_else(default_pinecone_api_key_env);
        self.resolve_env(&env_name)
            .ok_or(ConfigError::MissingEnvVar(env_name))
    }

    /// Render the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
