//! Shared pipeline state.
//!
//! [`RagState`] owns everything retrieval needs: configuration, the selected
//! embedding strategy, the vector index and the result cache. It is built
//! once at startup and passed by reference to the functions in
//! [`crate::rag::context`] and [`crate::rag::ingest`]. Cloning is cheap; the
//! clones share the same index and cache.

use std::sync::Arc;

use tracing::info;

use crate::db::{build_index, VectorIndex};
use crate::rag::cache::{CacheStats, QueryCache};
use crate::rag::embeddings::{Embedder, EmbeddingSelector, EmbeddingSettings};
use crate::types::Result;
use crate::utils::config::RecallConfig;

#[derive(Clone)]
pub struct RagState {
    pub config: Arc<RecallConfig>,
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub cache: Arc<QueryCache>,
}

impl RagState {
    /// Assemble state from injected parts. The cache is built from
    /// `config.cache`.
    pub fn new(
        config: RecallConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let cache = Arc::new(QueryCache::new(config.cache.clone()));
        Self {
            config: Arc::new(config),
            embedder,
            index,
            cache,
        }
    }

    /// Select the embedding strategy and index backend from configuration.
    pub fn from_config(config: RecallConfig) -> Result<Self> {
        let settings = EmbeddingSettings::from_config(&config);
        let embedder = EmbeddingSelector::build(&settings)?;
        let index = build_index(&config, embedder.clone())?;

        info!(
            embedder = embedder.backend_name(),
            index = index.provider_name(),
            "Retrieval pipeline ready"
        );
        Ok(Self::new(config, embedder, index))
    }

    /// Drop all cached query results.
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Release cached state at shutdown.
    pub fn close(&self) {
        let stats = self.cache.stats();
        self.clear();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate(),
            "Retrieval pipeline closed"
        );
    }
}
