//! Vector index
//!
//! Combines an embedder and a store, and owns the on-disk layout of a
//! persisted index.
//!
//! # Usage
//!
//! ```ignore
//! use pitchside_lib::index::VectorIndex;
//!
//! // Build from documents and persist
//! let index = VectorIndex::from_documents(&documents, chunker.as_ref(), embedder.clone())?;
//! index.persist(Path::new("index"))?;
//!
//! // Later: load and retrieve
//! let index = VectorIndex::load(Path::new("index"), embedder)?;
//! let results = index.retrieve("Who won the 2023 Champions League?", 10)?;
//! ```
//!
//! # Layout
//!
//! ```text
//! index/
//!   index_meta.json    format version, embed model, dimension, chunk count
//!   vector_store.json  chunks and their embeddings
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::chunk::{Chunk, Chunker};
use crate::document::Document;
use crate::embed::Embedder;
use crate::llm::Llm;
use crate::query::QueryEngine;
use crate::store::{MemoryStore, PersistentStore, SearchResult, VectorStore};
use crate::{Error, Result};

pub const META_FILE: &str = "index_meta.json";
const FORMAT_VERSION: u32 = 1;

/// Description of a persisted index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexMeta {
    pub format_version: u32,
    pub embed_model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Searchable index of embedded chunks.
pub struct VectorIndex<S: VectorStore = MemoryStore> {
    embedder: Arc<dyn Embedder>,
    store: S,
}

impl VectorIndex<MemoryStore> {
    /// Create an empty in-memory index.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_store(embedder, MemoryStore::new())
    }

    /// Chunk, embed and index `documents`.
    pub fn from_documents(
        documents: &[Document],
        chunker: &dyn Chunker,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let mut index = Self::new(embedder);
        index.insert_documents(documents, chunker)?;
        Ok(index)
    }
}

impl<S: VectorStore> VectorIndex<S> {
    pub fn with_store(embedder: Arc<dyn Embedder>, store: S) -> Self {
        Self { embedder, store }
    }

    /// Chunk and index documents, returning the number of chunks added.
    pub fn insert_documents(
        &mut self,
        documents: &[Document],
        chunker: &dyn Chunker,
    ) -> Result<usize> {
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| chunker.chunk_document(doc))
            .collect();
        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            strategy = chunker.name(),
            "indexing documents"
        );
        self.insert_chunks(&chunks)?;
        Ok(chunks.len())
    }

    /// Index chunks by computing embeddings and storing them.
    pub fn insert_chunks(&mut self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_documents(&texts)?;
        self.store.insert(chunks, &embeddings)
    }

    /// Top-`k` chunks most similar to `query`.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed_query(query)?;
        let results = self.store.search(&query_embedding, k)?;
        debug!(k, hits = results.len(), "retrieved chunks");
        Ok(results)
    }

    /// Returns the number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no chunks are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Wrap a shared index in a query engine answering with `llm`.
    pub fn as_query_engine(
        self: &Arc<Self>,
        llm: Arc<dyn Llm>,
        similarity_top_k: usize,
    ) -> QueryEngine<S> {
        QueryEngine::new(Arc::clone(self), llm, similarity_top_k)
    }
}

impl<S: PersistentStore> VectorIndex<S> {
    /// Whether a persisted index is present at `dir`.
    ///
    /// Only existence is checked; contents are validated by [`load`](Self::load).
    pub fn exists(dir: &Path) -> bool {
        dir.exists()
    }

    /// Write the index into `dir`, creating it if absent.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        self.store.persist(dir)?;

        let meta = IndexMeta {
            format_version: FORMAT_VERSION,
            embed_model: self.embedder.model_name().to_string(),
            dimension: self.embedder.dimension(),
            chunk_count: self.store.len(),
            created_at: Utc::now(),
        };
        fs::write(dir.join(META_FILE), serde_json::to_vec_pretty(&meta)?)?;

        info!(path = %dir.display(), chunks = meta.chunk_count, "persisted index");
        Ok(())
    }

    /// Load an index written by [`persist`](Self::persist).
    pub fn load(dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let meta = read_meta(dir)?;
        if meta.format_version != FORMAT_VERSION {
            return Err(Error::Store(format!(
                "unsupported index format version {} (expected {FORMAT_VERSION})",
                meta.format_version
            )));
        }
        if meta.embed_model != embedder.model_name() {
            warn!(
                stored = %meta.embed_model,
                configured = embedder.model_name(),
                "index was built with a different embedding model"
            );
        }

        let store = S::load(dir)?;
        info!(path = %dir.display(), chunks = store.len(), "loaded index");
        Ok(Self::with_store(embedder, store))
    }
}

/// Read the metadata file of a persisted index.
pub fn read_meta(dir: &Path) -> Result<IndexMeta> {
    let path = dir.join(META_FILE);
    let bytes = fs::read(&path)
        .map_err(|e| Error::Store(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Store(format!("corrupt {}: {e}", path.display())))
}
