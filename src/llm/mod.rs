//! LLM integration.
//!
//! A thin provider seam: [`LlmProvider`] takes a [`CompletionRequest`] and
//! returns generated text. The only implementation is [`GeminiProvider`],
//! which talks to the Gemini `generateContent` REST API.

mod gemini;

pub use gemini::GeminiProvider;

use async_trait::async_trait;

use crate::error::LlmError;

/// Message roles understood by the providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message in a completion request.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from a completion call.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Text-generation provider seam.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier this provider targets.
    fn model_name(&self) -> &str;

    /// One completion attempt. No retries at this layer.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
