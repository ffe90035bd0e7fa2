//! Text embedding backends.
//!
//! Two interchangeable strategies sit behind the [`Embedder`] trait:
//!
//! - [`MockEmbedder`]: deterministic, offline, 1536 dimensions. Identical text
//!   always yields the identical vector; similar text does not yield similar
//!   vectors. Meant for functional tests and local development.
//! - [`LiveEmbedder`]: an OpenAI-compatible `POST /embeddings` endpoint.
//!
//! The strategy is chosen once at startup by [`EmbeddingSelector`], whose
//! predicate is a pure function of [`EmbeddingSettings`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::types::{AppError, Result};
use crate::utils::config::{EmbeddingMode, RecallConfig};

/// Dimensionality of [`MockEmbedder`] vectors.
pub const MOCK_DIMENSIONS: usize = 1536;

/// Environment name that allows the live backend in `auto` mode.
pub const PRODUCTION_ENVIRONMENT: &str = "production";

const LCG_MULTIPLIER: u64 = 9301;
const LCG_INCREMENT: u64 = 49297;
const LCG_MODULUS: u64 = 233280;

/// Converts text into fixed-dimension vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Short backend name for logs and CLI output.
    fn backend_name(&self) -> &'static str;

    /// Length of every vector this backend produces.
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts one after another, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ============================================================================
// Deterministic mock
// ============================================================================

/// 32-bit rolling hash over UTF-16 code units: `h = h * 31 + unit (mod 2^32)`.
pub fn content_hash(text: &str) -> u32 {
    text.encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as u32))
}

/// Vector of `dimensions` values in `[-0.5, 0.5)` from a linear congruential
/// generator seeded with [`content_hash`].
pub fn mock_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let mut seed = content_hash(text) as u64;
    (0..dimensions)
        .map(|_| {
            seed = (seed * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
            (seed as f64 / LCG_MODULUS as f64 - 0.5) as f32
        })
        .collect()
}

/// Offline embedder producing content-seeded pseudo-random vectors.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            dimensions: MOCK_DIMENSIONS,
        }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn backend_name(&self) -> &'static str {
        "mock"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(text = %preview(text, 50), "Creating mock embedding");
        Ok(mock_embedding(text, self.dimensions))
    }
}

// ============================================================================
// Live backend
// ============================================================================

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible embeddings endpoint.
pub struct LiveEmbedder {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl LiveEmbedder {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for LiveEmbedder {
    fn backend_name(&self) -> &'static str {
        "live"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(text = %preview(text, 50), "Requesting embedding");

        let response = self
            .http_client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&json!({ "input": text, "model": self.model }))
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "embedding request failed ({}): {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("malformed response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Embedding("malformed response: missing embedding".into()))
    }
}

// ============================================================================
// Strategy selection
// ============================================================================

/// Everything the selection predicate looks at, resolved from config and
/// the environment.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub mode: EmbeddingMode,
    pub api_key: Option<String>,
    pub environment: Option<String>,
    pub model: String,
    pub api_base: String,
    pub dimensions: usize,
}

impl EmbeddingSettings {
    pub fn from_config(config: &RecallConfig) -> Self {
        Self {
            mode: config.embedding.mode,
            api_key: config.embedding_api_key(),
            environment: config.environment(),
            model: config.embedding.model.clone(),
            api_base: config.embedding.api_base.clone(),
            dimensions: config.embedding.dimensions,
        }
    }
}

/// True for credentials that are obviously not real: empty, `changeme`, or
/// starting with `sk-placeholder`, `fake`, `test`, `your-` or `dummy`.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim().to_ascii_lowercase();
    const PREFIXES: [&str; 5] = ["sk-placeholder", "fake", "test", "your-", "dummy"];
    key.is_empty() || key == "changeme" || PREFIXES.iter().any(|p| key.starts_with(p))
}

/// Chooses the embedding strategy.
pub struct EmbeddingSelector;

impl EmbeddingSelector {
    /// Whether the deterministic mock should be used.
    pub fn use_mock(settings: &EmbeddingSettings) -> bool {
        match settings.mode {
            EmbeddingMode::Mock => true,
            EmbeddingMode::Live => false,
            EmbeddingMode::Auto => {
                let key_usable = settings
                    .api_key
                    .as_deref()
                    .map(|k| !is_placeholder_key(k))
                    .unwrap_or(false);
                let production =
                    settings.environment.as_deref() == Some(PRODUCTION_ENVIRONMENT);
                !(key_usable && production)
            }
        }
    }

    /// Build the selected embedder.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Embedding`] in `live` mode without an API key.
    pub fn build(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
        if Self::use_mock(settings) {
            info!(mode = ?settings.mode, "Using mock embeddings");
            return Ok(Arc::new(MockEmbedder::new()));
        }

        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::Embedding("live embeddings require an API key".to_string())
            })?;

        info!(model = %settings.model, api_base = %settings.api_base, "Using live embeddings");
        Ok(Arc::new(LiveEmbedder::new(
            settings.api_base.clone(),
            api_key,
            settings.model.clone(),
            settings.dimensions,
        )))
    }
}
