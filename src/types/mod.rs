use recall_vector::Metadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============= Conversation Types =============

/// A chat turn handed to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Keep an existing id, otherwise assign a fresh UUID v4.
    pub fn with_id(mut self) -> Self {
        if self.id.is_none() {
            self.id = Some(Uuid::new_v4().to_string());
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        write!(f, "{}", role)
    }
}

// ============= RAG Types =============

/// A document supplied by an ingestion caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }
}

/// One ranked match from a vector index query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SearchResult {
    /// Build a result, reading `content` from the `text` metadata key.
    pub fn from_parts(id: impl Into<String>, score: f32, metadata: Metadata) -> Self {
        let content = metadata.get_str("text").map(str::to_string);
        Self {
            id: id.into(),
            score,
            metadata,
            content,
        }
    }
}

/// Context retrieved for a single query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub documents: Vec<SearchResult>,
    pub context_text: String,
}

/// System message plus the full ordered message list for the completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedPrompt {
    pub system_message: Message,
    pub messages: Vec<Message>,
}

/// Acknowledgement returned by index upserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertAck {
    pub upserted_count: usize,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index error: {0}")]
    Index(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text that is safe to show an end user. Backend failures collapse to a
    /// generic message so transport details never leak.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => format!("Invalid input: {}", msg),
            AppError::Configuration(_) => "The server is misconfigured".to_string(),
            AppError::Embedding(_)
            | AppError::DimensionMismatch { .. }
            | AppError::Index(_)
            | AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl From<recall_vector::Error> for AppError {
    fn from(err: recall_vector::Error) -> Self {
        match err {
            recall_vector::Error::DimensionMismatch { expected, actual } => {
                AppError::DimensionMismatch { expected, actual }
            }
            other => AppError::Index(other.to_string()),
        }
    }
}

impl From<crate::utils::config::ConfigError> for AppError {
    fn from(err: crate::utils::config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
