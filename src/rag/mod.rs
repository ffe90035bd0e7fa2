//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! This module turns personal notes into context for a completion service.
//!
//! # Module Structure
//!
//! - [`rag::chunker`](crate::rag::chunker) - Sentence-packing text chunker
//! - [`rag::embeddings`](crate::rag::embeddings) - Mock and live embedders plus backend selection
//! - [`rag::cache`](crate::rag::cache) - Time-bounded query result cache
//! - [`rag::filter`](crate::rag::filter) - Structured search filters
//! - [`rag::ingest`](crate::rag::ingest) - Document insertion and chunked ingestion
//! - [`rag::context`](crate::rag::context) - Context assembly and prompt augmentation
//!
//! # RAG Pipeline
//!
//! 1. **Ingestion** - Documents are chunked and embedded
//! 2. **Storage** - Embeddings are upserted into the vector index
//! 3. **Retrieval** - The query is served from cache or embedded and searched
//! 4. **Assembly** - Ranked results become token-bounded context text
//! 5. **Augmentation** - Context is placed in the system message ahead of the conversation
//!
//! # Example
//!
//! ```ignore
//! use recall::rag::{context, filter::SearchFilters, ingest};
//! use recall::state::RagState;
//!
//! let state = RagState::from_config(config)?;
//! ingest::ingest_document(&state, &document).await?;
//!
//! let filter = SearchFilters::categories(["notes"]).to_metadata_filter();
//! let prompt = context::build_augmented_prompt(&state, "what did I learn?", history, filter.as_ref()).await?;
//! ```

pub mod cache;
pub mod chunker;
pub mod context;
pub mod embeddings;
pub mod filter;
pub mod ingest;

pub use cache::{CacheConfig, CacheStats, QueryCache};
pub use chunker::{chunk_text, TextChunker};
pub use context::{build_augmented_prompt, get_relevant_context, RAG_SYSTEM_PROMPT};
pub use embeddings::{Embedder, EmbeddingSelector, LiveEmbedder, MockEmbedder};
pub use filter::{SearchFilters, SearchScope};
pub use ingest::{ingest_document, insert_document};
