use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EmbeddingConfig;
use crate::embed::{Embedder, Embedding};
use crate::http;
use crate::{Error, Result};

/// Embedder for OpenAI-compatible `/embeddings` APIs (Jina, OpenAI).
pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    batch_size: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl RemoteEmbedder {
    /// Build from config, taking the API key from the configured variable.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.api_key();
        if api_key.is_none() {
            warn!(var = config.api_key_env(), "embedding API key not set");
        }
        Self::new(config, api_key)
    }

    pub fn new(config: &EmbeddingConfig, api_key: Option<String>) -> Result<Self> {
        let model = config.model_name().to_string();
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            endpoint: format!("{}/embeddings", config.endpoint()),
            api_key,
            dimension: known_dimension(&model),
            model,
            batch_size: config.batch_size.max(1),
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        debug!(model = %self.model, count = texts.len(), "requesting embeddings");

        let response = http::authorize(self.client.post(&self.endpoint), self.api_key.as_deref())
            .json(&request)
            .send()?;
        let body: EmbeddingResponse = http::check(response)?.json()?;

        if body.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        let mut data = body.data;
        data.sort_by_key(|d| d.index);

        for d in &data {
            if self.dimension > 0 && d.embedding.len() != self.dimension {
                return Err(Error::Embedding(format!(
                    "dimension mismatch: expected {}, got {}",
                    self.dimension,
                    d.embedding.len()
                )));
            }
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

impl Embedder for RemoteEmbedder {
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_batch(batch)?);
        }
        Ok(embeddings)
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| Error::Embedding("provider returned no embeddings".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn known_dimension(model: &str) -> usize {
    match model {
        "jina-embeddings-v2-small-en" => 512,
        "jina-embeddings-v2-base-en" | "jina-embeddings-v2-base-de" => 768,
        "jina-embeddings-v3" => 1024,
        "text-embedding-3-small" | "text-embedding-ada-002" => 1536,
        "text-embedding-3-large" => 3072,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String, batch_size: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url: Some(base_url),
            model: Some("test-embed".to_string()),
            batch_size,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_embeddings_reordered_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer jina-key"))
            .and(body_partial_json(json!({"model": "test-embed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"embedding": [0.0, 1.0], "index": 1},
                    {"embedding": [1.0, 0.0], "index": 0}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = config(server.uri(), 32);
        let embeddings = tokio::task::spawn_blocking(move || {
            let embedder = RemoteEmbedder::new(&cfg, Some("jina-key".to_string()))?;
            embedder.embed_documents(&["first", "second"])
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_documents_sent_in_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"embedding": [1.0], "index": 0},
                    {"embedding": [2.0], "index": 1}
                ]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let cfg = config(server.uri(), 2);
        let embeddings = tokio::task::spawn_blocking(move || {
            RemoteEmbedder::new(&cfg, None)?.embed_documents(&["a", "b", "c", "d"])
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(embeddings.len(), 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_auth_failure_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "authentication_error: invalid API key"
            })))
            .mount(&server)
            .await;

        let cfg = config(server.uri(), 8);
        let err = tokio::task::spawn_blocking(move || {
            RemoteEmbedder::new(&cfg, None)?.embed_query("who won?")
        })
        .await
        .unwrap()
        .unwrap_err();

        match err {
            Error::Provider { status, message } => {
                assert_eq!(status, Some(401));
                assert!(message.contains("authentication_error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dimension_checked_for_known_models() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": [1.0, 2.0, 3.0], "index": 0}]
            })))
            .mount(&server)
            .await;

        let mut cfg = config(server.uri(), 8);
        cfg.model = Some("jina-embeddings-v2-base-en".to_string());
        let err = tokio::task::spawn_blocking(move || {
            RemoteEmbedder::new(&cfg, None)?.embed_query("Haaland goals")
        })
        .await
        .unwrap()
        .unwrap_err();

        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_known_dimensions() {
        assert_eq!(known_dimension("jina-embeddings-v2-base-en"), 768);
        assert_eq!(known_dimension("text-embedding-3-small"), 1536);
        assert_eq!(known_dimension("something-new"), 0);
    }
}
