//! Chat completion for incoming messages
//!
//! [`CompletionClient`] turns a user message plus the stored conversation into a
//! chat request, sends it through a [`ChatApi`] backend and extracts the reply.
//! Failures never reach the caller: they are logged and replaced with one of two
//! fixed fallback replies.

mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::db::ConversationTurn;
use crate::persona::Persona;

pub use openai::{DEFAULT_BASE_URL, OpenAiApi};

/// Number of past turns included in each request
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Reply used when the completion call fails
pub const ERROR_FALLBACK: &str = "An error occurred, please try again later.";

/// Reply used when the completion call succeeds but yields no choices
pub const NO_RESPONSE_FALLBACK: &str = "Sorry, I couldn\u{2019}t generate a response.";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Chat completion response body
///
/// A missing `choices` field decodes as an empty list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One generated alternative
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: ChoiceMessage,
}

/// Message inside a choice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Backend able to answer chat completion requests
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send one request and return the decoded response
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Build the message list for a request
///
/// The persona instruction comes first, then at most `window` of the most
/// recent turns in chronological order, then the new user message.
#[must_use]
pub fn build_messages(
    system_prompt: &str,
    user_message: &str,
    history: &[ConversationTurn],
    window: usize,
) -> Vec<ChatMessage> {
    let recent = &history[history.len().saturating_sub(window)..];

    let mut messages = Vec::with_capacity(recent.len() * 2 + 2);
    messages.push(ChatMessage::system(system_prompt));
    for turn in recent {
        messages.push(ChatMessage::user(&turn.user_message));
        messages.push(ChatMessage::assistant(&turn.assistant_response));
    }
    messages.push(ChatMessage::user(user_message));

    messages
}

/// Generates replies to user messages
#[derive(Clone)]
pub struct CompletionClient {
    api: Arc<dyn ChatApi>,
    model: String,
    persona: Persona,
    history_window: usize,
}

impl CompletionClient {
    /// Create a client with the default model, persona and history window
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self {
            api,
            model: DEFAULT_MODEL.to_string(),
            persona: Persona::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Set the model identifier
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the persona
    #[must_use]
    pub fn persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Set how many past turns are sent with each request
    #[must_use]
    pub const fn history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Build the request for a message without sending it
    #[must_use]
    pub fn request_for(&self, user_message: &str, history: &[ConversationTurn]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: build_messages(
                &self.persona.system_prompt,
                user_message,
                history,
                self.history_window,
            ),
        }
    }

    /// Generate a reply to `user_message`
    ///
    /// Returns [`ERROR_FALLBACK`] when the call fails and
    /// [`NO_RESPONSE_FALLBACK`] when it yields no choices. A choice without
    /// content yields an empty string.
    pub async fn generate(&self, user_message: &str, history: &[ConversationTurn]) -> String {
        let request = self.request_for(user_message, history);

        tracing::debug!(
            model = %request.model,
            message_count = request.messages.len(),
            "requesting completion"
        );

        match self.api.complete(&request).await {
            Ok(response) => {
                if let Some(choice) = response.choices.into_iter().next() {
                    choice.message.content.unwrap_or_default()
                } else {
                    tracing::warn!(model = %request.model, "completion returned no choices");
                    NO_RESPONSE_FALLBACK.to_string()
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "error generating response");
                ERROR_FALLBACK.to_string()
            }
        }
    }
}
