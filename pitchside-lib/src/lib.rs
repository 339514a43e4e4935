//! Pitchside - football statistics question answering over local documents
//!
//! # Architecture
//!
//! ```text
//! data dir -> DirectoryReader -> Chunker -> Embedder -> VectorIndex <-> index dir
//!                                                           |
//! question -> ReActAgent -> document_search -> QueryEngine -+-> Llm
//!                 |
//!              Llm + ChatMemoryBuffer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pitchside_lib::config::ReporterConfig;
//! use pitchside_lib::reporter::FootballStatsReporter;
//!
//! let config = ReporterConfig::from_file("pitchside.toml")?;
//! let mut reporter = FootballStatsReporter::new(config)?;
//!
//! let result = reporter.query("Who was the Premier League top scorer in 2022-23?")?;
//! println!("{}", result.answer);
//! ```

pub mod agent;
pub mod chunk;
pub mod config;
pub mod document;
pub mod embed;
pub mod error;
pub mod index;
pub mod llm;
pub mod query;
pub mod reporter;
pub mod store;

mod http;
#[cfg(test)]
mod testing;

pub use error::{Error, Result};
