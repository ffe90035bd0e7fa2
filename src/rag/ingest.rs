//! Document ingestion.
//!
//! [`insert_document`] stores a text as a single entry. [`ingest_document`]
//! chunks it first and stores one entry per chunk, ids `{doc_id}#{n}`.
//! Re-ingesting a document replaces it: chunks left over from a longer
//! earlier version are deleted.

use recall_vector::{FilterCondition, Metadata, MetadataFilter, VectorEntry};
use tracing::{debug, info, instrument};

use crate::rag::chunker::chunk_text;
use crate::state::RagState;
use crate::types::{AppError, Document, Result, UpsertAck};

/// Metadata key carrying the stored text.
pub const TEXT_KEY: &str = "text";
/// Metadata key linking a chunk to its document.
pub const DOCUMENT_ID_KEY: &str = "document_id";
/// Metadata key holding a chunk's position within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

const PREVIEW_CHARS: usize = 30;

/// Id of the `n`th chunk of `document_id`.
pub fn chunk_id(document_id: &str, n: usize) -> String {
    format!("{}#{}", document_id, n)
}

/// Filter selecting the chunks of `document_id` at position `from` or later.
fn stale_chunks(document_id: &str, from: usize) -> MetadataFilter {
    MetadataFilter::new()
        .equals(DOCUMENT_ID_KEY, document_id)
        .with(CHUNK_INDEX_KEY, FilterCondition::Gte(from.into()))
}

/// Embed `text` whole and upsert it under `id`. `text` is added to the
/// metadata so search results carry their content.
#[instrument(skip(state, text, metadata), fields(preview = %text.chars().take(PREVIEW_CHARS).collect::<String>()))]
pub async fn insert_document(
    state: &RagState,
    id: &str,
    text: &str,
    metadata: Metadata,
) -> Result<UpsertAck> {
    if id.is_empty() {
        return Err(AppError::InvalidInput("document id must not be empty".into()));
    }

    let vector = state.embedder.embed(text).await?;
    let mut metadata = metadata;
    metadata.insert(TEXT_KEY, text);

    let ack = state
        .index
        .upsert(vec![VectorEntry::new(id, vector, metadata)])
        .await?;
    debug!(id, upserted = ack.upserted_count, "Inserted document");
    Ok(ack)
}

/// Chunk a document, embed the chunks in order and upsert one entry per
/// chunk, then drop any older chunks of the same document beyond the new
/// count. A document with no sentences upserts nothing and removes every
/// chunk previously stored for it.
#[instrument(skip(state, document), fields(id = %document.id))]
pub async fn ingest_document(state: &RagState, document: &Document) -> Result<UpsertAck> {
    if document.id.is_empty() {
        return Err(AppError::InvalidInput("document id must not be empty".into()));
    }

    let chunks = chunk_text(&document.text, state.config.context.max_chunk_length);
    if chunks.is_empty() {
        let removed = state.index.delete_where(&stale_chunks(&document.id, 0)).await?;
        debug!(removed, "Document has no text to ingest");
        return Ok(UpsertAck::default());
    }

    let embeddings = state.embedder.embed_batch(&chunks).await?;
    let entries: Vec<VectorEntry> = chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(n, (chunk, vector))| {
            let mut metadata = document.metadata.clone();
            metadata.insert(TEXT_KEY, chunk);
            metadata.insert(DOCUMENT_ID_KEY, document.id.as_str());
            metadata.insert(CHUNK_INDEX_KEY, n);
            VectorEntry::new(chunk_id(&document.id, n), vector, metadata)
        })
        .collect();

    let chunk_count = entries.len();
    let ack = state.index.upsert(entries).await?;
    let removed = state
        .index
        .delete_where(&stale_chunks(&document.id, chunk_count))
        .await?;
    info!(chunks = ack.upserted_count, removed, "Ingested document");
    Ok(ack)
}
