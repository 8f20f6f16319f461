//! Generative chat collaborator for the studio website assistant.
//!
//! The model is stateless from this crate's point of view: every call
//! replays the conversation history. Session storage lives in the API
//! layer.

pub mod gemini;
pub mod prompt;

use async_trait::async_trait;

pub use gemini::{GeminiClient, GeminiConfig};
pub use prompt::STUDIO_SYSTEM_PROMPT;

/// Author of a turn as the model sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    User,
    Model,
}

/// One prior turn replayed to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTurn {
    pub role: ModelRole,
    pub text: String,
}

/// Errors from the chat model layer.
#[derive(Debug, thiserror::Error)]
pub enum ChatModelError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The model API returned a non-2xx status code.
    #[error("Chat model API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The model answered without any usable text (e.g. safety block).
    #[error("Chat model returned no text: {0}")]
    EmptyResponse(String),

    /// No API key is configured.
    #[error("Chat model is not configured")]
    NotConfigured,
}

impl ChatModelError {
    /// Whether the upstream rejected the call for quota reasons.
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::Api { status: 429, .. })
    }
}

/// Text generation capability.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        history: &[ModelTurn],
        message: &str,
    ) -> Result<String, ChatModelError>;
}

/// Model used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledChatModel;

#[async_trait]
impl ChatModel for DisabledChatModel {
    async fn generate(
        &self,
        _system: &str,
        _history: &[ModelTurn],
        _message: &str,
    ) -> Result<String, ChatModelError> {
        Err(ChatModelError::NotConfigured)
    }
}
