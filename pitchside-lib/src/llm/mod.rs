//! Language model clients
//!
//! Every supported provider (Groq, OpenRouter, OpenAI) speaks the OpenAI
//! chat-completions wire format, so a single client covers them; the
//! provider only changes endpoint, key variable, default model and, for
//! OpenRouter, two attribution headers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
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

/// Trait for chat language models
pub trait Llm: Send + Sync {
    /// Send a conversation and return the assistant's reply text.
    fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Single-turn completion of a prompt.
    fn complete(&self, prompt: &str) -> Result<String> {
        self.chat(&[ChatMessage::user(prompt)])
    }

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Build the chat model selected by `config`.
pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn Llm>> {
    Ok(Arc::new(ChatCompletionsLlm::from_config(config)?))
}

mod chat;

pub use chat::*;
