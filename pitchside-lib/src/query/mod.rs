//! Retrieval-augmented query engine
//!
//! Retrieves the top-k chunks for a question and asks the LLM to answer
//! from them alone.

use std::sync::Arc;

use tracing::debug;

use crate::index::VectorIndex;
use crate::llm::Llm;
use crate::store::{MemoryStore, SearchResult, VectorStore};
use crate::Result;

/// Text returned when retrieval finds nothing to answer from.
pub const EMPTY_RESPONSE: &str = "Empty Response";

/// Answer produced by a [`QueryEngine`]
#[derive(Debug, Clone)]
pub struct Response {
    pub text: String,
    /// Chunks the answer was synthesized from, best first
    pub source_nodes: Vec<SearchResult>,
}

pub struct QueryEngine<S: VectorStore = MemoryStore> {
    index: Arc<VectorIndex<S>>,
    llm: Arc<dyn Llm>,
    similarity_top_k: usize,
}

impl<S: VectorStore> QueryEngine<S> {
    pub fn new(index: Arc<VectorIndex<S>>, llm: Arc<dyn Llm>, similarity_top_k: usize) -> Self {
        Self {
            index,
            llm,
            similarity_top_k,
        }
    }

    pub fn query(&self, question: &str) -> Result<Response> {
        let source_nodes = self.index.retrieve(question, self.similarity_top_k)?;
        if source_nodes.is_empty() {
            return Ok(Response {
                text: EMPTY_RESPONSE.to_string(),
                source_nodes,
            });
        }

        let prompt = qa_prompt(question, &source_nodes);
        debug!(chunks = source_nodes.len(), model = self.llm.model(), "synthesizing answer");
        let text = self.llm.complete(&prompt)?;

        Ok(Response { text, source_nodes })
    }
}

fn qa_prompt(question: &str, sources: &[SearchResult]) -> String {
    let context = sources
        .iter()
        .map(|r| match r.chunk.metadata.extra.get("file_name") {
            Some(name) => format!("file_name: {name}\n\n{}", r.chunk.content),
            None => r.chunk.content.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {question}\n\
         Answer: "
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ParagraphChunker;
    use crate::document::Document;
    use crate::testing::{KeywordEmbedder, ScriptedLlm};

    fn index(docs: &[Document]) -> Arc<VectorIndex> {
        let embedder = Arc::new(KeywordEmbedder::new());
        Arc::new(VectorIndex::from_documents(docs, &ParagraphChunker::default(), embedder).unwrap())
    }

    #[test]
    fn test_query_synthesizes_from_context() {
        let docs = vec![
            Document::new("a", "Lionel Messi has won eight Ballon d'Or awards.")
                .with_metadata("file_name", "awards.txt"),
            Document::new("b", "The 1966 World Cup final was played at Wembley."),
        ];
        let llm = Arc::new(ScriptedLlm::new(["Eight."]));
        let engine = index(&docs).as_query_engine(llm.clone(), 1);

        let response = engine.query("How many Ballon d'Or awards has Messi won?").unwrap();

        assert_eq!(response.text, "Eight.");
        assert_eq!(response.source_nodes.len(), 1);

        let requests = llm.requests();
        let prompt = &requests[0][0].content;
        assert!(prompt.contains("file_name: awards.txt"));
        assert!(prompt.contains("eight Ballon d'Or"));
        assert!(!prompt.contains("Wembley"));
        assert!(prompt.ends_with("Query: How many Ballon d'Or awards has Messi won?\nAnswer: "));
    }

    #[test]
    fn test_empty_index_skips_llm() {
        let llm = Arc::new(ScriptedLlm::default());
        let engine = QueryEngine::new(
            Arc::new(VectorIndex::new(Arc::new(KeywordEmbedder::new()))),
            llm.clone(),
            10,
        );

        let response = engine.query("anything").unwrap();

        assert_eq!(response.text, EMPTY_RESPONSE);
        assert!(llm.requests().is_empty());
    }

    #[test]
    fn test_llm_errors_propagate() {
        let llm = Arc::new(ScriptedLlm::default());
        llm.push_failure("invalid_api_key");
        let engine =
            index(&[Document::new("a", "Kane joined Bayern Munich.")]).as_query_engine(llm, 3);

        let err = engine.query("Where did Kane go?").unwrap_err();
        assert!(err.is_remote());
    }
}
