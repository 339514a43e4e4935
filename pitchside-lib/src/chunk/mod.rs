//! Document chunking strategies
//!
//! Football sources come in two broad shapes:
//! - match reports and season reviews: prose, split on paragraph boundaries
//! - stat tables and CSV dumps: no paragraphs to speak of, split by size
//!
//! # Implementing a Chunker
//!
//! ```ignore
//! use pitchside_lib::chunk::{Chunker, Chunk, ChunkMetadata};
//!
//! struct MyChunker { /* ... */ }
//!
//! impl Chunker for MyChunker {
//!     fn chunk(&self, content: &str, metadata: ChunkMetadata) -> Vec<Chunk> {
//!         // Your chunking logic here
//!         todo!()
//!     }
//!
//!     fn name(&self) -> &str {
//!         "mine"
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::document::Document;

/// A chunk of text with its metadata
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Chunk {
    /// Identifier derived from source, ordinal and content; stable across runs
    pub id: String,
    /// The text content of this chunk
    pub content: String,
    /// Metadata about the source and position
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Build the `ordinal`-th chunk of a source, deriving its id.
    pub fn new(ordinal: usize, content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        let content = content.into();
        Self {
            id: generate_id(metadata.source_id.as_deref(), ordinal, &content),
            content,
            metadata,
        }
    }
}

/// Metadata associated with a chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct ChunkMetadata {
    /// Source document identifier
    pub source_id: Option<String>,
    /// Position within the source document (0-indexed, unit depends on the chunker)
    pub position: usize,
    /// Total number of chunks from this source
    pub total_chunks: Option<usize>,
    /// Metadata inherited from the source document
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// Trait for document chunking strategies
pub trait Chunker: Send + Sync {
    /// Split content into chunks
    ///
    /// # Arguments
    /// * `content` - The text content to chunk
    /// * `metadata` - Base metadata to attach to each chunk
    ///
    /// # Returns
    /// A vector of chunks with position metadata. Blank content yields none.
    fn chunk(&self, content: &str, metadata: ChunkMetadata) -> Vec<Chunk>;

    /// Returns the name of this chunking strategy
    fn name(&self) -> &str;

    /// Chunk a whole document, carrying its id and metadata onto every chunk.
    fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let metadata = ChunkMetadata {
            source_id: Some(document.id.clone()),
            extra: document.metadata.clone(),
            ..ChunkMetadata::default()
        };
        self.chunk(&document.content, metadata)
    }
}

fn generate_id(source_id: Option<&str>, ordinal: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_id.unwrap_or_default().as_bytes());
    hasher.update((ordinal as u64).to_le_bytes());
    hasher.update(content.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

mod fixed;
mod paragraph;

pub use fixed::*;
pub use paragraph::*;
