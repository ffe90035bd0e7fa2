//! Mock implementations for testing.
//!
//! This module provides mock embedders, indexes and completion services that
//! can be used across different test files without duplication.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use recall::db::{InMemoryIndex, VectorIndex};
use recall::llm::{CompletionRequest, CompletionService, TokenStream};
use recall::rag::embeddings::{mock_embedding, Embedder, MOCK_DIMENSIONS};
use recall::types::{AppError, Result, SearchResult, UpsertAck};
use recall::{RagState, RecallConfig};
use recall_vector::{MetadataFilter, VectorEntry};

/// Deterministic embedder that counts how often it is called.
#[derive(Default)]
pub struct CountingEmbedder {
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn backend_name(&self) -> &'static str {
        "counting"
    }

    fn dimensions(&self) -> usize {
        MOCK_DIMENSIONS
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(mock_embedding(text, MOCK_DIMENSIONS))
    }
}

/// Index whose every operation fails, as an unreachable backend would.
pub struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    fn provider_name(&self) -> &'static str {
        "failing"
    }

    async fn upsert(&self, _entries: Vec<VectorEntry>) -> Result<UpsertAck> {
        Err(AppError::Index("backend unavailable".into()))
    }

    async fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        Err(AppError::Index("backend unavailable".into()))
    }

    async fn delete(&self, _ids: &[String]) -> Result<usize> {
        Err(AppError::Index("backend unavailable".into()))
    }

    async fn delete_where(&self, _filter: &MetadataFilter) -> Result<usize> {
        Err(AppError::Index("backend unavailable".into()))
    }

    async fn count(&self) -> Result<usize> {
        Err(AppError::Index("backend unavailable".into()))
    }
}

/// Completion service that streams a fixed list of tokens and records the
/// last request it saw.
#[derive(Default)]
pub struct ScriptedCompletion {
    tokens: Vec<String>,
    last_request: parking_lot::Mutex<Option<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            last_request: parking_lot::Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn stream(&self, request: CompletionRequest) -> Result<TokenStream> {
        *self.last_request.lock() = Some(request);
        let tokens: Vec<Result<String>> = self.tokens.iter().cloned().map(Ok).collect();
        Ok(stream::iter(tokens).boxed())
    }
}

/// State over an empty in-memory index with the given embedder.
pub fn memory_state(embedder: Arc<dyn Embedder>) -> RagState {
    memory_state_with(RecallConfig::default(), embedder)
}

pub fn memory_state_with(config: RecallConfig, embedder: Arc<dyn Embedder>) -> RagState {
    let index = Arc::new(InMemoryIndex::with_dimensions(embedder.dimensions()));
    RagState::new(config, embedder, index)
}
