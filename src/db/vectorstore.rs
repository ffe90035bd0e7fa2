//! Vector Index Abstraction Layer
//!
//! This module provides a unified interface for vector index operations so
//! the retrieval pipeline works the same against every backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               VectorIndex Trait              │
//! ├──────────────────────────────────────────────┤
//! │  upsert  │  query  │  delete(_where) │ count │
//! └──────────────────────────────────────────────┘
//!         ▲                          ▲
//!         │                          │
//!  ┌──────┴────────┐         ┌───────┴───────┐
//!  │ InMemoryIndex │         │ PineconeIndex │
//!  │  (default)    │         │    (cloud)    │
//!  └───────────────┘         └───────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use recall::db::vectorstore::{InMemoryIndex, VectorIndex};
//!
//! let index = InMemoryIndex::new();
//! index.upsert(vec![VectorEntry::new("doc1", embedding, metadata)]).await?;
//! let results = index.query(&query_embedding, 5, None).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use recall_vector::{FlatIndex, Metadata, MetadataFilter, VectorEntry};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::rag::embeddings::Embedder;
use crate::types::{AppError, Document, Result, SearchResult, UpsertAck};

// ============================================================================
// Vector Index Trait
// ============================================================================

/// Abstract trait for vector index operations.
///
/// # Implementors
///
/// - `InMemoryIndex` - Exact linear scan, development and tests (default)
/// - `PineconeIndex` - Managed cloud service
///
/// Transport and backend failures surface as errors; there is no retry here.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Get the name of this index provider.
    fn provider_name(&self) -> &'static str;

    /// Insert entries, replacing any with the same id.
    async fn upsert(&self, entries: Vec<VectorEntry>) -> Result<UpsertAck>;

    /// Return at most `top_k` entries most similar to `vector`, best first.
    /// When `filter` is given, only entries satisfying every condition count.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>>;

    /// Delete entries by id. Returns how many were removed when the backend
    /// reports it.
    async fn delete(&self, ids: &[String]) -> Result<usize>;

    /// Delete every entry whose metadata satisfies `filter`. Returns how many
    /// were removed when the backend reports it.
    async fn delete_where(&self, filter: &MetadataFilter) -> Result<usize>;

    /// Number of stored entries.
    async fn count(&self) -> Result<usize>;
}

// ============================================================================
// Example documents
// ============================================================================

/// Documents used to bootstrap an empty in-memory index for demos.
pub fn example_documents() -> Vec<Document> {
    vec![
        Document::new(
            "mock-doc-1",
            "Vector databases store high-dimensional embeddings and answer nearest-neighbour \
             queries. They power semantic search by comparing the meaning of text rather than \
             its exact words.",
            Metadata::from_pairs([("source", "vector-databases.md"), ("category", "technology")]),
        ),
        Document::new(
            "mock-doc-2",
            "Personal knowledge management systems help you capture, organise and revisit \
             notes. Linking ideas across notes turns a pile of documents into a second brain.",
            Metadata::from_pairs([("source", "pkm-systems.md"), ("category", "productivity")]),
        ),
        Document::new(
            "mock-doc-3",
            "Retrieval-augmented generation retrieves relevant passages from a knowledge base \
             and places them in the prompt, so a language model answers from your own notes.",
            Metadata::from_pairs([("source", "rag-overview.md"), ("category", "technology")]),
        ),
    ]
}

// ============================================================================
// In-Memory Vector Index
// ============================================================================

/// In-process index backed by a linear-scan [`FlatIndex`].
///
/// Data is not persisted and will be lost when the process exits.
pub struct InMemoryIndex {
    index: FlatIndex,
    seeder: Option<Arc<dyn Embedder>>,
    /// Set once seeding has succeeded. A failed attempt leaves it unset so
    /// the next query retries.
    seeded: OnceCell<()>,
}

impl InMemoryIndex {
    /// Create an empty index; the first upsert fixes the dimensionality.
    pub fn new() -> Self {
        Self {
            index: FlatIndex::new(),
            seeder: None,
            seeded: OnceCell::new(),
        }
    }

    /// Create an empty index that only accepts `dimensions`-length vectors.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            index: FlatIndex::with_dimensions(dimensions),
            seeder: None,
            seeded: OnceCell::new(),
        }
    }

    /// Seed [`example_documents`] on the first query that finds the index
    /// empty, embedding them with `embedder`.
    pub fn with_seed_examples(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.seeder = Some(embedder);
        self
    }

    async fn seed_if_empty(&self) -> Result<()> {
        let Some(embedder) = &self.seeder else {
            return Ok(());
        };
        if self.seeded.initialized() || !self.index.is_empty() {
            return Ok(());
        }

        // Concurrent callers wait on the one running seed.
        self.seeded
            .get_or_try_init(|| async {
                if !self.index.is_empty() {
                    return Ok(());
                }
                let documents = example_documents();
                let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
                let embeddings = embedder.embed_batch(&texts).await?;

                let entries = documents
                    .into_iter()
                    .zip(embeddings)
                    .map(|(doc, vector)| {
                        let mut metadata = doc.metadata;
                        metadata.insert("text", doc.text);
                        VectorEntry::new(doc.id, vector, metadata)
                    });
                let count = self.index.upsert_batch(entries)?;
                info!(count, "Seeded in-memory index with example documents");
                Ok::<(), AppError>(())
            })
            .await?;
        Ok(())
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.index.clear(true);
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn upsert(&self, entries: Vec<VectorEntry>) -> Result<UpsertAck> {
        debug!(count = entries.len(), "In-memory upsert");
        let upserted_count = self.index.upsert_batch(entries)?;
        Ok(UpsertAck { upserted_count })
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        self.seed_if_empty().await?;

        let results = self
            .index
            .search(vector, top_k, filter)?
            .into_iter()
            .map(|hit| SearchResult::from_parts(hit.id, hit.score, hit.metadata))
            .collect();
        Ok(results)
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        Ok(self.index.delete(ids))
    }

    async fn delete_where(&self, filter: &MetadataFilter) -> Result<usize> {
        Ok(self.index.delete_matching(filter))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.index.len())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embeddings::{mock_embedding, MockEmbedder, MOCK_DIMENSIONS};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` batch calls, then embeds like the mock.
    struct FlakyEmbedder {
        failures: usize,
        batches: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for FlakyEmbedder {
        fn backend_name(&self) -> &'static str {
            "flaky"
        }

        fn dimensions(&self) -> usize {
            MOCK_DIMENSIONS
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(mock_embedding(text, MOCK_DIMENSIONS))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.batches.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(AppError::Embedding("backend outage".into()));
            }
            Ok(texts
                .iter()
                .map(|t| mock_embedding(t, MOCK_DIMENSIONS))
                .collect())
        }
    }

    fn entry(id: &str, vector: Vec<f32>, category: &str, text: &str) -> VectorEntry {
        VectorEntry::new(
            id,
            vector,
            Metadata::from_pairs([("category", category), ("text", text)]),
        )
    }

    #[tokio::test]
    async fn test_inmemory_upsert_and_query() {
        let index = InMemoryIndex::new();
        let ack = index
            .upsert(vec![
                entry("doc1", vec![1.0, 0.0, 0.0], "notes", "Hello world"),
                entry("doc2", vec![0.0, 1.0, 0.0], "notes", "Goodbye world"),
                entry("doc3", vec![0.9, 0.1, 0.0], "notes", "Hello again"),
            ])
            .await
            .unwrap();
        assert_eq!(ack.upserted_count, 3);

        let results = index.query(&[1.0, 0.0, 0.0], 2, None).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "doc1");
        assert_eq!(results[0].content.as_deref(), Some("Hello world"));
        assert_eq!(results[1].id, "doc3");
    }

    #[tokio::test]
    async fn test_inmemory_upsert_replaces_by_id() {
        let index = InMemoryIndex::new();
        index
            .upsert(vec![entry("doc1", vec![1.0, 0.0], "notes", "old")])
            .await
            .unwrap();
        index
            .upsert(vec![entry("doc1", vec![0.0, 1.0], "notes", "new")])
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let results = index.query(&[0.0, 1.0], 5, None).await.unwrap();
        assert_eq!(results[0].content.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_inmemory_query_with_filter() {
        let index = InMemoryIndex::new();
        index
            .upsert(vec![
                entry("a", vec![1.0, 0.0], "notes", "a"),
                entry("b", vec![1.0, 0.1], "recipes", "b"),
            ])
            .await
            .unwrap();

        let filter = MetadataFilter::from_pairs([("category", "recipes")]);
        let results = index.query(&[1.0, 0.0], 5, Some(&filter)).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "b");
    }

    #[tokio::test]
    async fn test_inmemory_dimension_mismatch() {
        let index = InMemoryIndex::with_dimensions(3);
        let err = index
            .upsert(vec![entry("a", vec![1.0, 0.0], "notes", "a")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_inmemory_delete() {
        let index = InMemoryIndex::new();
        index
            .upsert(vec![entry("doc1", vec![1.0, 0.0, 0.0], "notes", "Test")])
            .await
            .unwrap();

        let deleted = index.delete(&["doc1".to_string()]).await.unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_no_seeding_by_default() {
        let index = InMemoryIndex::new();
        let results = index.query(&[1.0, 0.0], 5, None).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seeds_examples_on_first_empty_query() {
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new());
        let index = InMemoryIndex::with_dimensions(embedder.dimensions())
            .with_seed_examples(embedder.clone());
        let query = embedder.embed("semantic search").await.unwrap();

        let results = index.query(&query, 5, None).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().any(|r| r.id == "mock-doc-1"));
        assert!(results.iter().all(|r| r.content.is_some()));

        // Emptying the index does not trigger a second seeding.
        index.clear();
        assert!(index.query(&query, 5, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_seeding_is_retried() {
        let embedder = Arc::new(FlakyEmbedder {
            failures: 1,
            batches: AtomicUsize::new(0),
        });
        let index = InMemoryIndex::new().with_seed_examples(embedder.clone());
        let query = mock_embedding("semantic search", MOCK_DIMENSIONS);

        let err = index.query(&query, 5, None).await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert_eq!(index.count().await.unwrap(), 0);

        let results = index.query(&query, 5, None).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(embedder.batches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_queries_seed_once() {
        let embedder = Arc::new(FlakyEmbedder {
            failures: 0,
            batches: AtomicUsize::new(0),
        });
        let index = Arc::new(InMemoryIndex::new().with_seed_examples(embedder.clone()));
        let query = mock_embedding("semantic search", MOCK_DIMENSIONS);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let index = index.clone();
                let query = query.clone();
                tokio::spawn(async move { index.query(&query, 5, None).await })
            })
            .collect();

        for handle in handles {
            let results = handle.await.unwrap().unwrap();
            assert_eq!(results.len(), 3);
        }
        assert_eq!(embedder.batches.load(Ordering::SeqCst), 1);
        assert_eq!(index.count().await.unwrap(), 3);
    }

    #[test]
    fn test_example_documents_have_sources() {
        let docs = example_documents();
        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|d| d.metadata.get_str("source").is_some()));
    }
}
