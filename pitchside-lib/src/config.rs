//! Reporter configuration
//!
//! Everything is passed explicitly into the reporter; nothing is stored in
//! process-wide state, so several reporters with different providers can
//! live in one process. API keys are read from the environment at the point
//! a provider client is built.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunker, FixedSizeChunker, ParagraphChunker};
use crate::{Error, Result};

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful AI Football Stats Reporter with access to a database of football information:
1. Your role is to find a particular statistic related to a football player or team and to display it as a response.
2. You are responsible to find reliable and trustable data from your tool to access the database and provide the requested information.
3. You are only supposed to answer queries related to football statistics and no other topic or sport.
4. Responses will only be displayed for queries related to football.";

/// Top-level configuration for a [`FootballStatsReporter`](crate::reporter::FootballStatsReporter).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReporterConfig {
    /// Directory of source documents, read recursively
    pub data_path: PathBuf,
    /// Directory holding the persisted index
    pub index_path: PathBuf,
    /// Instructions placed at the top of every agent conversation
    pub system_prompt: String,
    /// Chunks retrieved per document search
    pub similarity_top_k: usize,
    /// Token ceiling of the agent's chat memory
    pub memory_token_limit: usize,
    /// Reasoning steps allowed per query before giving up
    pub max_iterations: usize,
    /// Log agent reasoning at info level instead of debug
    pub verbose: bool,
    pub error_handling: ErrorHandling,
    /// Attach the date/time tool to the agent
    pub enable_datetime_tool: bool,
    pub chunking: ChunkingConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data"),
            index_path: PathBuf::from("index"),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            similarity_top_k: 10,
            memory_token_limit: 4096,
            max_iterations: 10,
            verbose: true,
            error_handling: ErrorHandling::default(),
            enable_datetime_tool: false,
            chunking: ChunkingConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl ReporterConfig {
    /// Defaults with the given document directory.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_index_path(mut self, index_path: impl Into<PathBuf>) -> Self {
        self.index_path = index_path.into();
        self
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the reporter unusable.
    pub fn validate(&self) -> Result<()> {
        if self.similarity_top_k == 0 {
            return Err(Error::Config("similarity_top_k must be at least 1".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(Error::Config("max_iterations must be at least 1".to_string()));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be at least 1".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(
                "chunking.chunk_overlap must be smaller than chunking.chunk_size".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::Config("embedding.batch_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// What `query` does when the remote model call fails.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    /// Return the error to the caller
    #[default]
    Propagate,
    /// Answer with a short user-facing message instead of failing
    Classify,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    #[default]
    Paragraph,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub strategy: ChunkStrategy,
    /// Chunk size in characters
    pub chunk_size: usize,
    /// Overlap between neighbouring chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Paragraph,
            chunk_size: 1024,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn build(&self) -> Box<dyn Chunker> {
        match self.strategy {
            ChunkStrategy::Paragraph => Box::new(ParagraphChunker {
                max_size: self.chunk_size,
                overlap: self.chunk_overlap,
            }),
            ChunkStrategy::Fixed => Box::new(FixedSizeChunker {
                chunk_size: self.chunk_size,
                overlap: self.chunk_overlap,
            }),
        }
    }
}

/// Chat-completions providers. All speak the OpenAI wire format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    Groq,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "openai")]
    OpenAi,
}

impl LlmProvider {
    pub fn name(self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenRouter => "openrouter",
            Self::OpenAi => "openai",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::Groq => "llama-3.1-70b-versatile",
            Self::OpenRouter => "meta-llama/llama-3.1-70b-instruct",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    fn default_api_key_env(self) -> &'static str {
        match self {
            Self::Groq => "GROQ_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openrouter" => Ok(Self::OpenRouter),
            "openai" => Ok(Self::OpenAi),
            other => Err(Error::Config(format!("unknown llm provider: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Model id; the provider default when unset
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    /// Override the provider endpoint (proxies, tests)
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Sent as `HTTP-Referer` to OpenRouter; falls back to `OPENROUTER_SITE_URL`
    pub site_url: Option<String>,
    /// Sent as `X-Title` to OpenRouter; falls back to `OPENROUTER_SITE_NAME`
    pub site_name: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            model: None,
            temperature: 0.1,
            max_tokens: None,
            timeout_secs: 60,
            base_url: None,
            api_key_env: None,
            site_url: None,
            site_name: None,
        }
    }
}

impl LlmConfig {
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(self.provider.default_model())
    }

    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.provider.default_base_url())
            .trim_end_matches('/')
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or(self.provider.default_api_key_env())
    }

    /// The API key, if the environment provides a non-empty one.
    pub fn api_key(&self) -> Option<String> {
        read_env(self.api_key_env())
    }

    /// Attribution headers; only OpenRouter uses them.
    pub fn attribution(&self) -> (Option<String>, Option<String>) {
        if self.provider != LlmProvider::OpenRouter {
            return (None, None);
        }
        (
            self.site_url.clone().or_else(|| read_env("OPENROUTER_SITE_URL")),
            self.site_name.clone().or_else(|| read_env("OPENROUTER_SITE_NAME")),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    #[default]
    Jina,
    #[serde(rename = "openai")]
    OpenAi,
    /// In-process ONNX model via fastembed
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    /// Model id; the provider default when unset
    pub model: Option<String>,
    /// Texts per embedding request
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Jina,
            model: None,
            batch_size: 32,
            timeout_secs: 60,
            base_url: None,
            api_key_env: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn model_name(&self) -> &str {
        if let Some(model) = &self.model {
            return model;
        }
        match self.provider {
            EmbeddingProvider::Jina => "jina-embeddings-v2-base-en",
            EmbeddingProvider::OpenAi => "text-embedding-3-small",
            EmbeddingProvider::Local => "BAAI/bge-small-en-v1.5",
        }
    }

    pub fn endpoint(&self) -> &str {
        let default = match self.provider {
            EmbeddingProvider::Jina => "https://api.jina.ai/v1",
            EmbeddingProvider::OpenAi | EmbeddingProvider::Local => "https://api.openai.com/v1",
        };
        self.base_url.as_deref().unwrap_or(default).trim_end_matches('/')
    }

    pub fn api_key_env(&self) -> &str {
        if let Some(var) = &self.api_key_env {
            return var;
        }
        match self.provider {
            EmbeddingProvider::Jina => "JINA_API_KEY",
            EmbeddingProvider::OpenAi | EmbeddingProvider::Local => "OPENAI_API_KEY",
        }
    }

    pub fn api_key(&self) -> Option<String> {
        read_env(self.api_key_env())
    }
}

fn read_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
