//! Football statistics reporter
//!
//! Owns the configuration, the vector index and the agent, and exposes a
//! single [`query`](FootballStatsReporter::query) operation.
//!
//! # Usage
//!
//! ```ignore
//! use pitchside_lib::config::ReporterConfig;
//! use pitchside_lib::reporter::FootballStatsReporter;
//!
//! let config = ReporterConfig::new("./data").with_index_path("./index");
//! let mut reporter = FootballStatsReporter::new(config)?;
//! let result = reporter.query("Who won the 2022 World Cup?")?;
//! println!("{}", result.answer);
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --load_or_create_index--> Ready
//! ```
//!
//! If the index directory exists it is loaded as is; otherwise every file
//! under the data directory is read, indexed and persisted before the agent
//! is created.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::{datetime_tool, ChatMemoryBuffer, QueryEngineTool, ReActAgent, ToolMetadata};
use crate::config::{ErrorHandling, ReporterConfig};
use crate::document::DirectoryReader;
use crate::embed::{self, Embedder};
use crate::index::VectorIndex;
use crate::llm::{self, Llm};
use crate::store::MemoryStore;
use crate::{Error, Result};

mod classify;

pub use classify::ProviderFailure;

pub const SEARCH_TOOL_NAME: &str = "document_search";
pub const SEARCH_TOOL_DESCRIPTION: &str =
    "Get information about football statistics, matches and players from the knowledge base";

/// Answer to a user query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryResult {
    pub answer: String,
    /// Always empty; retrieval sources are not surfaced through the agent
    pub source_nodes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Uninitialized,
    Ready,
}

/// Which branch [`FootballStatsReporter::load_or_create_index`] took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    Loaded,
    Created,
}

pub struct FootballStatsReporter {
    config: ReporterConfig,
    llm: Arc<dyn Llm>,
    embedder: Arc<dyn Embedder>,
    index: Option<Arc<VectorIndex>>,
    agent: Option<ReActAgent>,
}

impl FootballStatsReporter {
    /// Build providers from `config`, then load or create the index.
    pub fn new(config: ReporterConfig) -> Result<Self> {
        config.validate()?;
        let llm = llm::from_config(&config.llm)?;
        let embedder = embed::from_config(&config.embedding)?;
        Self::with_providers(config, llm, embedder)
    }

    /// Like [`new`](Self::new) with caller-supplied providers.
    pub fn with_providers(
        config: ReporterConfig,
        llm: Arc<dyn Llm>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        config.validate()?;
        let mut reporter = Self::uninitialized(config, llm, embedder);
        reporter.load_or_create_index()?;
        Ok(reporter)
    }

    /// Create the reporter without touching the filesystem. Call
    /// [`load_or_create_index`](Self::load_or_create_index) before querying.
    pub fn uninitialized(
        config: ReporterConfig,
        llm: Arc<dyn Llm>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            config,
            llm,
            embedder,
            index: None,
            agent: None,
        }
    }

    /// Load the persisted index, or build and persist one, then create the
    /// agent. Fails on a reporter that is already ready.
    pub fn load_or_create_index(&mut self) -> Result<IndexOrigin> {
        if self.agent.is_some() {
            return Err(Error::InvalidInput("reporter is already initialized".to_string()));
        }
        self.config.validate()?;

        let index_path = &self.config.index_path;
        let (index, origin) = if VectorIndex::<MemoryStore>::exists(index_path) {
            let index = VectorIndex::load(index_path, Arc::clone(&self.embedder))?;
            (index, IndexOrigin::Loaded)
        } else {
            (self.create_index()?, IndexOrigin::Created)
        };

        if index.is_empty() {
            warn!(path = %index_path.display(), "index holds no chunks");
        }
        self.index = Some(Arc::new(index));
        self.create_agent()?;
        Ok(origin)
    }

    fn create_index(&self) -> Result<VectorIndex> {
        let data_path = &self.config.data_path;
        let documents = DirectoryReader::new(data_path).load_data()?;
        if documents.is_empty() {
            return Err(Error::NoDocuments(data_path.clone()));
        }

        let chunker = self.config.chunking.build();
        let index = VectorIndex::from_documents(
            &documents,
            chunker.as_ref(),
            Arc::clone(&self.embedder),
        )?;
        index.persist(&self.config.index_path)?;
        Ok(index)
    }

    fn create_agent(&mut self) -> Result<()> {
        let index = self.index.as_ref().ok_or(Error::NotInitialized("index"))?;
        let engine = index.as_query_engine(Arc::clone(&self.llm), self.config.similarity_top_k);
        let search_tool = QueryEngineTool::new(
            engine,
            ToolMetadata::new(SEARCH_TOOL_NAME, SEARCH_TOOL_DESCRIPTION),
        );

        let mut agent = ReActAgent::new(Arc::clone(&self.llm))
            .with_tool(search_tool)
            .with_system_prompt(self.config.system_prompt.as_str())
            .with_memory(ChatMemoryBuffer::new(self.config.memory_token_limit))
            .with_max_iterations(self.config.max_iterations)
            .verbose(self.config.verbose);
        if self.config.enable_datetime_tool {
            agent = agent.with_tool(datetime_tool());
        }

        info!(
            model = self.llm.model(),
            tools = agent.tools().count(),
            chunks = index.len(),
            "agent ready"
        );
        self.agent = Some(agent);
        Ok(())
    }

    /// Ask the agent a question.
    ///
    /// With [`ErrorHandling::Classify`], any failure of the agent becomes an
    /// answer carrying a short user-facing message.
    pub fn query(&mut self, text: &str) -> Result<QueryResult> {
        let agent = self.agent.as_mut().ok_or(Error::NotInitialized("agent"))?;

        let answer = match agent.chat(text) {
            Ok(answer) => answer,
            Err(e)
                if self.config.error_handling == ErrorHandling::Classify
                    && !matches!(e, Error::NotInitialized(_)) =>
            {
                let failure = ProviderFailure::classify(&e);
                warn!(?failure, error = %e, "query failed");
                failure.message().to_string()
            }
            Err(e) => return Err(e),
        };

        Ok(QueryResult {
            answer,
            source_nodes: Vec::new(),
        })
    }

    /// Persist the index to the configured index path.
    pub fn save_index(&self) -> Result<()> {
        self.index
            .as_ref()
            .ok_or(Error::NotInitialized("index"))?
            .persist(&self.config.index_path)
    }

    /// Clear the agent's conversation memory.
    pub fn reset_chat(&mut self) {
        if let Some(agent) = self.agent.as_mut() {
            agent.reset();
        }
    }

    pub fn state(&self) -> ReporterState {
        if self.agent.is_some() {
            ReporterState::Ready
        } else {
            ReporterState::Uninitialized
        }
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    pub fn index(&self) -> Option<&Arc<VectorIndex>> {
        self.index.as_ref()
    }

    pub fn agent(&self) -> Option<&ReActAgent> {
        self.agent.as_ref()
    }
}
