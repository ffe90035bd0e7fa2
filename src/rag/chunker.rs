//! Sentence-packing text chunker.
//!
//! Text is split on `.`, each fragment trimmed, empty fragments dropped, and
//! the period re-appended. Sentences are then packed greedily into chunks of
//! at most `max_chunk_length` characters. A single sentence longer than the
//! limit is emitted whole, so the bound is advisory for oversized sentences.

/// Default chunk length in characters.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 1000;

/// Greedy sentence chunker.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_chunk_length: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_LENGTH)
    }
}

impl TextChunker {
    pub fn new(max_chunk_length: usize) -> Self {
        Self { max_chunk_length }
    }

    pub fn max_chunk_length(&self) -> usize {
        self.max_chunk_length
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.max_chunk_length)
    }
}

/// Split `text` into period-terminated sentences.
pub fn sentences(text: &str) -> impl Iterator<Item = String> + '_ {
    text.trim()
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{}.", s))
}

/// Pack sentences of `text` into chunks of at most `max_chunk_length`
/// characters. Empty input yields no chunks.
pub fn chunk_text(text: &str, max_chunk_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in sentences(text) {
        let sentence_len = sentence.chars().count();
        if current_len + sentence_len > max_chunk_length && current_len > 0 {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(&sentence);
        current_len += sentence_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
