use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::http;
use crate::llm::{ChatMessage, Llm};
use crate::{Error, Result};

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatCompletionsLlm {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    site_url: Option<String>,
    site_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatCompletionsLlm {
    /// Build from config, taking the API key from the configured variable.
    ///
    /// A missing key is only logged: the provider rejects the first request,
    /// which is where the failure belongs.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key();
        if api_key.is_none() {
            warn!(
                var = config.api_key_env(),
                provider = config.provider.name(),
                "LLM API key not set"
            );
        }
        Self::new(config, api_key)
    }

    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Result<Self> {
        let (site_url, site_name) = config.attribution();
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            endpoint: format!("{}/chat/completions", config.endpoint()),
            api_key,
            model: config.model_name().to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            site_url,
            site_name,
        })
    }
}

impl Llm for ChatCompletionsLlm {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        debug!(model = %self.model, messages = messages.len(), "chat completion request");

        let mut builder =
            http::authorize(self.client.post(&self.endpoint), self.api_key.as_deref());
        if let Some(url) = &self.site_url {
            builder = builder.header("HTTP-Referer", url);
        }
        if let Some(name) = &self.site_name {
            builder = builder.header("X-Title", name);
        }

        let response = builder.json(&request).send()?;
        let body: ChatResponse = http::check(response)?.json()?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Provider {
                status: None,
                message: "response contained no message content".to_string(),
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
