//! ReAct agent
//!
//! The model is asked to alternate `Thought:` / `Action:` / `Action Input:`
//! steps, receiving an `Observation:` after each tool call, until it emits
//! an `Answer:`. Finished exchanges are kept in a [`ChatMemoryBuffer`] so
//! follow-up questions see earlier turns.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::llm::{ChatMessage, Llm};
use crate::{Error, Result};

mod memory;
mod output;
mod tool;

pub use memory::{estimate_tokens, ChatMemoryBuffer};
pub use output::{parse_step, FormatError, ReasoningStep};
pub use tool::{datetime_tool, FunctionTool, QueryEngineTool, Tool, ToolMetadata};

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

const REACT_FORMAT: &str = "\
To answer the question, use the following format:

Thought: what you need to do next, in the same language as the question.
Action: the tool name, one of {tool_names}, if a tool is needed.
Action Input: the tool input as JSON, e.g. {\"input\": \"Premier League top scorer 2023\"}

Start every reply with a Thought. After an Action you will receive:

Observation: the tool's response

Repeat Thought/Action/Action Input as often as needed. Once you can answer
without more tools, reply with:

Thought: I can answer without using any more tools.
Answer: your answer, in the same language as the question.";

/// Tool-using conversational agent.
pub struct ReActAgent {
    llm: Arc<dyn Llm>,
    tools: Vec<Box<dyn Tool>>,
    memory: ChatMemoryBuffer,
    system_prompt: String,
    max_iterations: usize,
    verbose: bool,
}

impl ReActAgent {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm,
            tools: Vec::new(),
            memory: ChatMemoryBuffer::default(),
            system_prompt: String::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            verbose: false,
        }
    }

    #[must_use]
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    #[must_use]
    pub fn with_memory(mut self, memory: ChatMemoryBuffer) -> Self {
        self.memory = memory;
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn tools(&self) -> impl Iterator<Item = &ToolMetadata> {
        self.tools.iter().map(|t| t.metadata())
    }

    pub fn memory(&self) -> &ChatMemoryBuffer {
        &self.memory
    }

    /// Forget the conversation so far.
    pub fn reset(&mut self) {
        self.memory.reset();
    }

    /// Run one user turn to completion and return the answer.
    ///
    /// Errors from the model itself are returned unchanged. A tool that
    /// fails locally, an unknown tool name or malformed output is reported
    /// back to the model as an observation instead.
    pub fn chat(&mut self, message: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(self.memory.all().len() + 4);
        messages.push(ChatMessage::system(self.system_header()));
        messages.extend(self.memory.get());
        messages.push(ChatMessage::user(message));

        for iteration in 1..=self.max_iterations {
            let reply = self.llm.chat(&messages)?;

            let observation = match parse_step(&reply) {
                Ok(ReasoningStep::Answer { thought, answer }) => {
                    self.log_step(iteration, "Thought", &thought);
                    self.log_step(iteration, "Answer", &answer);
                    self.memory.put(ChatMessage::user(message));
                    self.memory.put(ChatMessage::assistant(answer.clone()));
                    return Ok(answer);
                }
                Ok(ReasoningStep::Action { thought, tool, input }) => {
                    self.log_step(iteration, "Thought", &thought);
                    self.log_step(iteration, "Action", &format!("{tool} {input}"));
                    self.run_tool(&tool, &input)?
                }
                Err(e) => {
                    warn!(iteration, "{e}");
                    format!("{e}. Please follow the Thought/Action/Action Input/Answer format.")
                }
            };
            self.log_step(iteration, "Observation", &observation);

            messages.push(ChatMessage::assistant(reply));
            messages.push(ChatMessage::user(format!("Observation: {observation}")));
        }

        Err(Error::Agent(format!(
            "reached max iterations ({}) without an answer",
            self.max_iterations
        )))
    }

    fn run_tool(&self, name: &str, input: &str) -> Result<String> {
        let Some(tool) = self.tools.iter().find(|t| t.metadata().name == name) else {
            return Ok(format!(
                "Error: no tool named `{name}`. Available tools: {}",
                self.tool_names()
            ));
        };

        match tool.call(input) {
            Ok(output) => Ok(output),
            Err(e) if e.is_remote() => Err(e),
            Err(e) => Ok(format!("Error: {e}")),
        }
    }

    fn tool_names(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.metadata().name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn system_header(&self) -> String {
        let mut header = String::new();
        if !self.system_prompt.is_empty() {
            header.push_str(&self.system_prompt);
            header.push_str("\n\n");
        }

        header.push_str("You have access to the following tools:\n");
        for tool in &self.tools {
            let meta = tool.metadata();
            header.push_str(&format!("> Tool Name: {}\n", meta.name));
            header.push_str(&format!("Tool Description: {}\n", meta.description));
            header.push_str("Tool Args: {\"input\": {\"type\": \"string\"}}\n\n");
        }
        header.push_str(&REACT_FORMAT.replace("{tool_names}", &self.tool_names()));
        header
    }

    fn log_step(&self, iteration: usize, label: &str, text: &str) {
        if self.verbose {
            info!(iteration, "{label}: {text}");
        } else {
            debug!(iteration, "{label}: {text}");
        }
    }
}
