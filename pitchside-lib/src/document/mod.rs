//! Source documents and the directory reader that produces them
//!
//! # Usage
//!
//! ```ignore
//! use pitchside_lib::document::DirectoryReader;
//!
//! let documents = DirectoryReader::new("./data").load_data()?;
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A loaded source document.
///
/// Documents only live between reading and indexing; the index keeps chunks,
/// not documents.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Document {
    /// Stable identifier, the file path for documents read from disk
    pub id: String,
    /// Full text content
    pub content: String,
    /// Open-ended key/value metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document without metadata.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

mod reader;

pub use reader::*;
