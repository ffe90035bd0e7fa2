//! Completion Service Boundary
//!
//! Generation itself happens outside this crate. This module defines what is
//! handed across the boundary:
//!
//! - [`CompletionRequest`] - model, ordered messages and sampling settings,
//!   serialisable in the OpenAI chat format
//! - [`CompletionService`] - the trait a streaming completion client implements
//! - [`guarded_stream`] - runs context assembly in front of a completion
//!   stream so a retrieval failure ends the stream quietly
//!
//! # Example
//!
//! ```ignore
//! use recall::llm::{guarded_stream, CompletionService};
//!
//! let mut tokens = guarded_stream(state, service, question, history, None);
//! while let Some(token) = tokens.next().await {
//!     print!("{}", token?);
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use recall_vector::MetadataFilter;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rag::context::build_augmented_prompt;
use crate::state::RagState;
use crate::types::{AugmentedPrompt, Message, MessageRole, Result};
use crate::utils::config::CompletionConfig;

/// Stream of generated text fragments.
pub type TokenStream = BoxStream<'static, Result<String>>;

/// A message as the completion service sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: MessageRole,
    pub content: String,
}

impl From<&Message> for CompletionMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Body of a chat completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Build a request from an augmented prompt. The system message stays
    /// first.
    pub fn from_prompt(prompt: &AugmentedPrompt, config: &CompletionConfig) -> Self {
        Self {
            model: config.model.clone(),
            messages: prompt.messages.iter().map(CompletionMessage::from).collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// A streaming chat completion client.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Start generating and return the token stream.
    async fn stream(&self, request: CompletionRequest) -> Result<TokenStream>;
}

/// Assemble context for `query` and stream the completion.
///
/// If context assembly fails the failure is logged and the stream ends with
/// no items. Errors from the completion service itself are passed through.
pub fn guarded_stream(
    state: RagState,
    service: Arc<dyn CompletionService>,
    query: String,
    prior_messages: Vec<Message>,
    filter: Option<MetadataFilter>,
) -> TokenStream {
    let stream = async_stream::stream! {
        let prompt = match build_augmented_prompt(&state, &query, prior_messages, filter.as_ref()).await {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Context assembly failed, ending response stream");
                return;
            }
        };

        let request = CompletionRequest::from_prompt(&prompt, &state.config.completion);
        let mut tokens = match service.stream(request).await {
            Ok(tokens) => tokens,
            Err(e) => {
                yield Err(e);
                return;
            }
        };

        while let Some(token) = tokens.next().await {
            yield token;
        }
    };

    stream.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::RecallConfig;

    struct EchoService;

    #[async_trait]
    impl CompletionService for EchoService {
        async fn stream(&self, request: CompletionRequest) -> Result<TokenStream> {
            let roles: Vec<Result<String>> = request
                .messages
                .into_iter()
                .map(|m| Ok(m.role.to_string()))
                .collect();
            Ok(futures::stream::iter(roles).boxed())
        }
    }

    fn prompt() -> AugmentedPrompt {
        let system_message = Message::new(MessageRole::System, "ctx").with_id();
        AugmentedPrompt {
            messages: vec![system_message.clone(), Message::user("question").with_id()],
            system_message,
        }
    }

    #[test]
    fn test_request_from_prompt_uses_config() {
        let request = CompletionRequest::from_prompt(&prompt(), &CompletionConfig::default());

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, 1000);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[1].content, "question");
    }

    #[test]
    fn test_request_serializes_without_ids() {
        let request = CompletionRequest::from_prompt(&prompt(), &CompletionConfig::default());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json["messages"][0].get("id").is_none());
        assert_eq!(json["max_tokens"], 1000);
    }

    #[tokio::test]
    async fn test_guarded_stream_puts_system_first() {
        let state = RagState::from_config(RecallConfig::default()).unwrap();
        let tokens: Vec<String> = guarded_stream(
            state,
            Arc::new(EchoService),
            "anything".into(),
            vec![Message::user("anything")],
            None,
        )
        .map(|t| t.unwrap())
        .collect()
        .await;

        assert_eq!(tokens, vec!["system", "user"]);
    }

    #[tokio::test]
    async fn test_guarded_stream_accepts_blank_query() {
        let state = RagState::from_config(RecallConfig::default()).unwrap();
        let tokens: Vec<String> = guarded_stream(
            state,
            Arc::new(EchoService),
            "   ".into(),
            vec![Message::user("   ")],
            None,
        )
        .map(|t| t.unwrap())
        .collect()
        .await;

        assert_eq!(tokens, vec!["system", "user"]);
    }
}
