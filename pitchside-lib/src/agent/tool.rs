//! Tools the agent can call

use chrono::Local;

use crate::query::QueryEngine;
use crate::store::{MemoryStore, VectorStore};
use crate::Result;

/// Name and description shown to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A named callable exposed to the agent.
pub trait Tool: Send + Sync {
    fn metadata(&self) -> &ToolMetadata;

    /// Run the tool on the model-supplied input and return its observation.
    fn call(&self, input: &str) -> Result<String>;
}

/// Document search backed by a [`QueryEngine`].
pub struct QueryEngineTool<S: VectorStore = MemoryStore> {
    engine: QueryEngine<S>,
    metadata: ToolMetadata,
}

impl<S: VectorStore> QueryEngineTool<S> {
    pub fn new(engine: QueryEngine<S>, metadata: ToolMetadata) -> Self {
        Self { engine, metadata }
    }
}

impl<S: VectorStore> Tool for QueryEngineTool<S> {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    fn call(&self, input: &str) -> Result<String> {
        Ok(self.engine.query(input)?.text)
    }
}

type ToolFn = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Tool wrapping a plain closure. A `None` result is reported as `"None"`.
pub struct FunctionTool {
    func: ToolFn,
    metadata: ToolMetadata,
}

impl FunctionTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
            metadata: ToolMetadata::new(name, description),
        }
    }
}

impl Tool for FunctionTool {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    fn call(&self, input: &str) -> Result<String> {
        Ok((self.func)(input).unwrap_or_else(|| "None".to_string()))
    }
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Reports the local date and time when the input asks for the current date.
pub fn datetime_tool() -> FunctionTool {
    FunctionTool::new(
        "custom_tool",
        "Returns the current date and time if asked",
        |input| {
            input
                .to_lowercase()
                .contains("current date")
                .then(|| {
                    let now = Local::now().format(DATETIME_FORMAT);
                    format!("The current date and time is: {now}")
                })
        },
    )
}
