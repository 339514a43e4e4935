//! Text embedding
//!
//! Two families of embedder:
//! - [`RemoteEmbedder`]: OpenAI-style `/embeddings` endpoints (Jina by
//!   default, `jina-embeddings-v2-base-en`, 768 dimensions)
//! - [`LocalEmbedder`]: BAAI/bge-small-en-v1.5 run in-process through
//!   fastembed (ONNX runtime), for working offline
//!
//! # Usage
//!
//! ```ignore
//! use pitchside_lib::embed::{self, Embedder};
//!
//! let embedder = embed::from_config(&config.embedding)?;
//!
//! // Embed documents (for indexing)
//! let doc_embeddings = embedder.embed_documents(&["Match report...", "Season stats..."])?;
//!
//! // Embed query (for searching)
//! let query_embedding = embedder.embed_query("Who scored the winning goal?")?;
//! ```

use std::sync::Arc;

use crate::config::{EmbeddingConfig, EmbeddingProvider};
use crate::Result;

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
///
/// Embedders are shared between the index and the query path, so methods
/// take `&self`.
pub trait Embedder: Send + Sync {
    /// Embed multiple documents for indexing
    ///
    /// Implementations batch requests as their backend requires.
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for searching
    ///
    /// Note: Some models (like BGE) use different prompts for queries vs documents.
    /// This method handles that distinction.
    fn embed_query(&self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension, or 0 when the model is not known
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

/// Build the embedder selected by `config`.
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    Ok(match config.provider {
        EmbeddingProvider::Jina | EmbeddingProvider::OpenAi => {
            Arc::new(RemoteEmbedder::from_config(config)?)
        }
        EmbeddingProvider::Local => Arc::new(LocalEmbedder::new()?),
    })
}

mod local;
mod remote;

pub use local::*;
pub use remote::*;
