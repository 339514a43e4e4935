use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::embed::Embedding;
use crate::store::{PersistentStore, SearchResult, VectorStore};
use crate::{Error, Result};

/// File written by [`MemoryStore::persist`] inside the index directory.
pub const STORE_FILE: &str = "vector_store.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    chunk: Chunk,
    embedding: Embedding,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    dimension: usize,
    entries: Vec<Entry>,
}

/// In-memory vector store.
///
/// Brute-force cosine similarity over every entry, which is plenty for a
/// few thousand chunks of football reports. Entries are kept ordered by
/// chunk id so persisted files are deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Entry>,
    dimension: usize,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension of the stored embeddings, 0 while empty.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl VectorStore for MemoryStore {
    fn insert(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::InvalidInput(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut dimension = self.dimension;
        for embedding in embeddings {
            if dimension == 0 {
                dimension = embedding.len();
            }
            if embedding.len() != dimension {
                return Err(Error::InvalidInput(format!(
                    "embedding dimension {} does not match store dimension {dimension}",
                    embedding.len()
                )));
            }
        }
        self.dimension = dimension;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            self.entries.insert(
                chunk.id.clone(),
                Entry {
                    chunk: chunk.clone(),
                    embedding: embedding.clone(),
                },
            );
        }
        Ok(())
    }

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(Error::InvalidInput(format!(
                "query dimension {} does not match store dimension {}",
                query.len(),
                self.dimension
            )));
        }

        // min-heap of the best k seen so far
        let mut best: BinaryHeap<Reverse<SearchResult>> = BinaryHeap::with_capacity(k + 1);
        for entry in self.entries.values() {
            best.push(Reverse(SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding),
            }));
            if best.len() > k {
                best.pop();
            }
        }

        // ascending order of Reverse is descending score
        Ok(best.into_sorted_vec().into_iter().map(|Reverse(r)| r).collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.dimension = 0;
    }
}

impl PersistentStore for MemoryStore {
    fn persist(&self, dir: &Path) -> Result<()> {
        let file = StoreFile {
            dimension: self.dimension,
            entries: self.entries.values().cloned().collect(),
        };
        let mut writer = BufWriter::new(File::create(dir.join(STORE_FILE))?);
        serde_json::to_writer(&mut writer, &file)?;
        writer.flush()?;
        Ok(())
    }

    fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(STORE_FILE);
        let file = File::open(&path)
            .map_err(|e| Error::Store(format!("cannot open {}: {e}", path.display())))?;
        let stored: StoreFile = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Store(format!("corrupt {}: {e}", path.display())))?;

        let mut store = Self::new();
        let (chunks, embeddings): (Vec<_>, Vec<_>) = stored
            .entries
            .into_iter()
            .map(|e| (e.chunk, e.embedding))
            .unzip();
        store.insert(&chunks, &embeddings)?;
        if store.dimension == 0 {
            store.dimension = stored.dimension;
        }
        Ok(store)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
