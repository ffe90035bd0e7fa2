//! # recall - retrieval core for a personal knowledge base
//!
//! Turns notes into answers a language model can ground on: text is chunked
//! into sentence-packed pieces, embedded, stored in a vector index, and
//! retrieved by similarity to build a context-bearing system prompt.
//!
//! ## Overview
//!
//! recall can be used in two ways:
//!
//! 1. **As a command-line tool** - Run the `recall` binary
//! 2. **As a library** - Import the pipeline into your own Rust project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use recall::{rag, RagState, RecallConfig};
//! use recall::types::{Document, Message};
//!
//! #[tokio::main]
//! async fn main() -> recall::Result<()> {
//!     let state = RagState::from_config(RecallConfig::load_or_default("recall.toml")?)?;
//!
//!     rag::ingest_document(&state, &Document::new("today", notes_text, metadata)).await?;
//!
//!     let prompt = rag::build_augmented_prompt(
//!         &state,
//!         "what did I decide about the index?",
//!         vec![Message::user("what did I decide about the index?")],
//!         None,
//!     )
//!     .await?;
//!     assert_eq!(prompt.messages[0], prompt.system_message);
//!
//!     state.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`rag`] - Chunking, embeddings, caching, filters, ingestion and context assembly
//! - [`db`] - Vector index backends (in-memory, Pinecone)
//! - [`llm`] - Completion service boundary types
//! - [`state`] - Shared pipeline state
//! - [`cli`] - Command-line driver
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration loading
//!
//! ## Backend Selection
//!
//! Embedding and index backends are chosen once, when [`RagState`] is built
//! from `recall.toml`. Without a real API key in a `production` environment
//! the deterministic mock embedder is used, so everything runs offline.

#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line parsing and subcommand handlers.
pub mod cli;
/// Vector index backends.
pub mod db;
/// Completion service boundary.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Shared pipeline state.
pub mod state;
/// Core types (documents, messages, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use db::{InMemoryIndex, PineconeIndex, VectorIndex};
pub use llm::{guarded_stream, CompletionRequest, CompletionService};
pub use rag::{Embedder, EmbeddingSelector, QueryCache};
pub use state::RagState;
pub use types::{AppError, Result};
pub use utils::config::RecallConfig;
