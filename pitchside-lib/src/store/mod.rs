//! Vector storage backends
//!
//! # Storage Model
//!
//! Each stored item consists of:
//! - Chunk: the original text and metadata
//! - Embedding: the vector representation
//!
//! # Usage
//!
//! ```ignore
//! use pitchside_lib::store::{MemoryStore, PersistentStore, VectorStore};
//!
//! let mut store = MemoryStore::new();
//!
//! // Insert chunks with their embeddings
//! store.insert(&chunks, &embeddings)?;
//!
//! // Search by vector similarity
//! let results = store.search(&query_embedding, 5)?;
//!
//! // Write to disk and read back
//! store.persist(Path::new("index"))?;
//! let store = MemoryStore::load(Path::new("index"))?;
//! ```

use std::cmp::Ordering;
use std::path::Path;

use crate::chunk::Chunk;
use crate::embed::Embedding;
use crate::Result;

/// A search result with similarity score
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity, -1.0 to 1.0 (higher is more similar)
    pub score: f32,
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchResult {}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchResult {
    // ties broken by chunk id so equal scores order deterministically
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.chunk.id.cmp(&self.chunk.id))
    }
}

/// Trait for vector storage backends
pub trait VectorStore: Send + Sync {
    /// Insert chunks with their embeddings
    ///
    /// # Arguments
    /// * `chunks` - The text chunks to store
    /// * `embeddings` - Corresponding embeddings (must be same length)
    ///
    /// A chunk whose id is already stored replaces the old entry.
    fn insert(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()>;

    /// Search for similar chunks
    ///
    /// # Arguments
    /// * `query_embedding` - The query vector
    /// * `k` - Number of results to return
    ///
    /// # Returns
    /// Top-k results sorted by similarity (highest first)
    fn search(&self, query_embedding: &Embedding, k: usize) -> Result<Vec<SearchResult>>;

    /// Get total number of stored chunks
    fn len(&self) -> usize;

    /// Check if store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all stored data
    fn clear(&mut self);
}

/// A store that can be written to and read back from a directory.
pub trait PersistentStore: VectorStore + Sized {
    /// Write the store into `dir`, which must already exist.
    fn persist(&self, dir: &Path) -> Result<()>;

    /// Read a store previously written by [`persist`](Self::persist).
    fn load(dir: &Path) -> Result<Self>;
}

mod memory;

pub use memory::*;
