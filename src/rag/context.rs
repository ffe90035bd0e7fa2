//! Context assembly for retrieval-augmented prompts.
//!
//! A query is served from the [`QueryCache`](crate::rag::cache::QueryCache)
//! when possible; otherwise it is embedded, the index is searched with the
//! configured `top_k`, and the results are cached. Results are formatted as
//! delimited blocks, truncated to the token budget, and substituted into
//! [`RAG_SYSTEM_PROMPT`].

use recall_vector::MetadataFilter;
use tracing::{debug, instrument, warn};

use crate::rag::chunker::chunk_text;
use crate::state::RagState;
use crate::types::{
    AppError, AugmentedPrompt, Message, MessageRole, Result, RetrievedContext, SearchResult,
};

/// Instruction template for the completion service. `{{context}}` is
/// replaced with the retrieved context.
pub const RAG_SYSTEM_PROMPT: &str = "You are a personal knowledge assistant that answers questions from the user's own notes.

Follow these rules when you answer:
1. Use ONLY the information in the context below.
2. If the context does not contain the answer, say \"I don't have information about that in your knowledge base\" instead of guessing.
3. Keep answers concise and direct.
4. When a source is given for the information you use, cite it.
5. Answer the current question only and leave out unrelated detail.

Context information:
{{context}}";

const CONTEXT_PLACEHOLDER: &str = "{{context}}";
const SOURCE_KEY: &str = "source";

/// Approximate token count: `ceil(chars / chars_per_token)`.
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> usize {
    text.chars().count().div_ceil(chars_per_token.max(1))
}

/// Format one result as a `---` delimited block with its source line.
pub fn format_result(result: &SearchResult) -> String {
    let source = result.metadata.get_str(SOURCE_KEY).unwrap_or("Unknown");
    format!(
        "---\n{}\nSource: {}\n",
        result.content.as_deref().unwrap_or_default(),
        source
    )
}

/// Join formatted result blocks with blank-line separators.
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(format_result)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Character allowance for `max_tokens`, saturating for extreme settings.
fn char_budget(max_tokens: usize, chars_per_token: usize) -> usize {
    max_tokens.saturating_mul(chars_per_token.max(1))
}

/// Cut `context` down to `max_tokens`.
///
/// The text is re-chunked at `max_tokens * chars_per_token` characters and
/// only the first chunk is kept, so the highest-ranked results survive. If
/// that chunk is still over budget (one oversized sentence) it is cut at
/// the character limit.
pub fn truncate_context(context: &str, max_tokens: usize, chars_per_token: usize) -> String {
    if estimate_tokens(context, chars_per_token) <= max_tokens {
        return context.to_string();
    }

    let max_chars = char_budget(max_tokens, chars_per_token);
    let first = chunk_text(context, max_chars)
        .into_iter()
        .next()
        .unwrap_or_default();

    if first.chars().count() > max_chars {
        first.chars().take(max_chars).collect()
    } else {
        first
    }
}

/// Build the system message for `context_text`.
pub fn create_system_message(context_text: &str) -> Message {
    Message::new(
        MessageRole::System,
        RAG_SYSTEM_PROMPT.replace(CONTEXT_PLACEHOLDER, context_text),
    )
    .with_id()
}

/// Cache key for a query. Unfiltered queries use the raw query string;
/// filtered ones append the serialised filter so differently filtered
/// searches never share an entry.
fn cache_key(query: &str, filter: Option<&MetadataFilter>) -> Result<String> {
    match filter {
        None => Ok(query.to_string()),
        Some(filter) => {
            let encoded = serde_json::to_string(filter)
                .map_err(|e| AppError::Internal(format!("failed to encode filter: {}", e)))?;
            Ok(format!("{}\u{1f}{}", query, encoded))
        }
    }
}

/// Retrieve ranked results for `query`, consulting the cache first.
///
/// Any string is a valid query, the empty one included. Cache entries are
/// keyed by the exact query text, plus the serialised filter when one is
/// given, so the same query under different filters is cached separately.
#[instrument(skip(state, filter), fields(filtered = filter.is_some()))]
pub async fn search(
    state: &RagState,
    query: &str,
    filter: Option<&MetadataFilter>,
) -> Result<Vec<SearchResult>> {
    let key = cache_key(query, filter)?;
    if let Some(results) = state.cache.get(&key) {
        debug!(count = results.len(), "Serving query from cache");
        return Ok(results);
    }

    let embedding = state.embedder.embed(query).await?;
    let results = state
        .index
        .query(&embedding, state.config.index.top_k, filter)
        .await?;
    debug!(count = results.len(), "Index query complete");

    state.cache.put(key, results.clone());
    Ok(results)
}

/// Retrieve documents for `query` and assemble them into context text that
/// fits the configured token budget.
#[instrument(skip(state, filter))]
pub async fn get_relevant_context(
    state: &RagState,
    query: &str,
    filter: Option<&MetadataFilter>,
) -> Result<RetrievedContext> {
    let documents = search(state, query, filter).await?;
    if documents.is_empty() {
        return Ok(RetrievedContext::default());
    }

    let context = &state.config.context;
    let formatted = format_context(&documents);
    let tokens = estimate_tokens(&formatted, context.chars_per_token);

    let context_text = if tokens > context.max_context_tokens {
        warn!(
            tokens,
            max_tokens = context.max_context_tokens,
            "Context exceeds token budget, truncating"
        );
        truncate_context(&formatted, context.max_context_tokens, context.chars_per_token)
    } else {
        formatted
    };

    Ok(RetrievedContext {
        documents,
        context_text,
    })
}

/// Build the message list for a completion call: the context-bearing system
/// message followed by `prior_messages`, each given an id if it lacks one.
#[instrument(skip(state, prior_messages, filter), fields(prior = prior_messages.len()))]
pub async fn build_augmented_prompt(
    state: &RagState,
    query: &str,
    prior_messages: Vec<Message>,
    filter: Option<&MetadataFilter>,
) -> Result<AugmentedPrompt> {
    let context = get_relevant_context(state, query, filter).await?;
    let system_message = create_system_message(&context.context_text);

    let mut messages = Vec::with_capacity(prior_messages.len() + 1);
    messages.push(system_message.clone());
    messages.extend(prior_messages.into_iter().map(Message::with_id));

    Ok(AugmentedPrompt {
        system_message,
        messages,
    })
}
