//! Vector index backends.
//!
//! - `in-memory` (default) - exact linear scan held in process
//! - `pinecone` - managed cloud index over its REST API
//!
//! The backend is chosen once at startup from `[index]` in `recall.toml`
//! via [`build_index`].

pub mod pinecone;
pub mod vectorstore;

use std::sync::Arc;

use tracing::info;

pub use pinecone::PineconeIndex;
pub use vectorstore::{example_documents, InMemoryIndex, VectorIndex};

use crate::rag::embeddings::Embedder;
use crate::types::{AppError, Result};
use crate::utils::config::{IndexProvider, RecallConfig};

/// Create the configured vector index.
///
/// The in-memory index is locked to the embedder's dimensionality and, when
/// `index.seed_examples` is set, seeds example documents with that embedder.
///
/// # Errors
///
/// Returns [`AppError::Configuration`] if Pinecone is selected without a host
/// or its API key variable is unset.
pub fn build_index(config: &RecallConfig, embedder: Arc<dyn Embedder>) -> Result<Arc<dyn VectorIndex>> {
    match config.index.provider {
        IndexProvider::Memory => {
            let mut index = InMemoryIndex::with_dimensions(embedder.dimensions());
            if config.index.seed_examples {
                index = index.with_seed_examples(embedder);
            }
            info!(seed_examples = config.index.seed_examples, "Using in-memory vector index");
            Ok(Arc::new(index))
        }
        IndexProvider::Pinecone => {
            let pinecone = config.index.pinecone.as_ref().ok_or_else(|| {
                AppError::Configuration("index.pinecone section is required".into())
            })?;
            let api_key = config.pinecone_api_key()?;
            info!(host = %pinecone.host, "Using Pinecone vector index");
            Ok(Arc::new(PineconeIndex::new(pinecone.host.clone(), api_key)))
        }
    }
}
