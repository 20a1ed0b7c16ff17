// Top-k retrieval policy over the vector index

use crate::llm::provider::EmbeddingProvider;
use crate::rag::index::VectorIndex;
use crate::types::{AppResult, RetrievalResult};
use std::sync::Arc;
use tracing::debug;

/// Embeds the query and searches the index with a fixed top-k.
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k: top_k.max(1),
        }
    }

    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<RetrievalResult>> {
        let vector = self.embedder.embed(query).await?;
        let results = self.index.search(&vector, self.top_k);
        debug!(hits = results.len(), k = self.top_k, "Retrieved context");
        Ok(results)
    }
}
