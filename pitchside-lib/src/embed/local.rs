use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

const QUERY_PREFIX: &str = "Represent this sentence for searching relevant passages: ";

/// BGE embedder using BAAI/bge-small-en-v1.5.
///
/// Runs locally through fastembed, so indexing works without an embedding
/// API key. Produces 384-dimensional embeddings.
pub struct LocalEmbedder {
    model: Mutex<TextEmbedding>,
}

impl LocalEmbedder {
    /// Create a new local embedder.
    ///
    /// Downloads the model on first use (~130MB).
    pub fn new() -> Result<Self> {
        let opts = InitOptions::new(EmbeddingModel::BGESmallENV15)
            .with_show_download_progress(true);

        TextEmbedding::try_new(opts)
            .map(|model| Self {
                model: Mutex::new(model),
            })
            .map_err(|e| Error::Embedding(e.to_string()))
    }

    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| Error::Embedding("embedding model lock poisoned".to_string()))?;
        model
            .embed(texts, None)
            .map_err(|e| Error::Embedding(e.to_string()))
    }
}

impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        "BAAI/bge-small-en-v1.5"
    }

    fn dimension(&self) -> usize {
        384
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed(texts)
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        // BGE retrieves better when queries carry an instruction prefix
        let query_text = format!("{QUERY_PREFIX}{text}");

        self.embed(&[query_text.as_str()])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires model download, run with: cargo test -- --ignored
    fn test_dimension_matches_output() {
        let embedder = LocalEmbedder::new().unwrap();
        let embedding = embedder.embed_query("Who won the 2022 World Cup?").unwrap();
        assert_eq!(embedding.len(), embedder.dimension());
    }

    #[test]
    #[ignore] // Requires model download
    fn test_related_text_is_closer() {
        let embedder = LocalEmbedder::new().unwrap();
        let docs = embedder
            .embed_documents(&[
                "Argentina beat France on penalties in the 2022 World Cup final.",
                "The recipe needs two cups of flour and an egg.",
            ])
            .unwrap();
        let query = embedder.embed_query("Who won the World Cup final?").unwrap();

        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&query, &docs[0]) > dot(&query, &docs[1]));
    }
}
