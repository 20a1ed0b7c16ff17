// Document-to-index ingestion pipeline

use crate::config::IngestConfig;
use crate::llm::provider::EmbeddingProvider;
use crate::rag::chunker::Chunker;
use crate::rag::index::VectorIndex;
use crate::rag::loader;
use crate::types::{AppError, AppResult};
use std::path::Path;
use tracing::info;

/// Runs the full ingestion batch: load pages, chunk, embed, build and persist
/// the index. Any stage failure aborts the run; the save is atomic, so a
/// previously persisted index stays usable.
pub async fn run(
    document_path: &Path,
    index_path: &Path,
    config: &IngestConfig,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<()> {
    info!(document = %document_path.display(), "Starting ingestion");

    let pages = loader::load(document_path)?;
    info!(pages = pages.len(), "Loaded pages");

    let chunker = Chunker::new(config.chunk_size, config.chunk_overlap);
    let chunks = chunker.split(&pages);
    info!(chunks = chunks.len(), "Created chunks");

    if chunks.is_empty() {
        return Err(AppError::Parse(
            "document produced no text chunks".to_string(),
        ));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    info!(model = embedder.model_name(), "Embedding chunks");
    let vectors = embedder.embed_batch(&texts).await?;

    let entries = chunks.into_iter().zip(vectors).collect();
    let index = VectorIndex::build(entries, embedder.model_name())?;
    index.save(index_path)?;

    info!(
        entries = index.len(),
        path = %index_path.display(),
        "Ingestion complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;

    /// Deterministic stand-in embedder: vector derived from text length.
    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn model_name(&self) -> &str {
            "stub-embedder"
        }
    }

    fn temp_path(name: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}_{}.{ext}", name, uuid::Uuid::new_v4()))
    }

    fn ingest_config() -> IngestConfig {
        IngestConfig {
            document_path: String::new(),
            index_path: String::new(),
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }

    #[tokio::test]
    async fn missing_document_aborts_and_writes_nothing() {
        let index_path = temp_path("ingest_missing_doc", "json");
        let err = run(
            Path::new("/nonexistent/filing.pdf"),
            &index_path,
            &ingest_config(),
            &StubEmbedder,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::DocumentNotFound(_)));
        assert!(!index_path.exists());
    }

    #[tokio::test]
    async fn failed_run_leaves_previous_index_untouched() {
        use crate::types::Chunk;

        let index_path = temp_path("ingest_keeps_previous", "json");
        let previous = VectorIndex::build(
            vec![(
                Chunk {
                    text: "existing".to_string(),
                    source_page: 0,
                    sequence: 0,
                },
                vec![1.0, 0.0],
            )],
            "stub-embedder",
        )
        .unwrap();
        previous.save(&index_path).unwrap();

        let err = run(
            Path::new("/nonexistent/filing.pdf"),
            &index_path,
            &ingest_config(),
            &StubEmbedder,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::DocumentNotFound(_)));

        let reopened = VectorIndex::open(&index_path).unwrap();
        std::fs::remove_file(&index_path).ok();
        assert_eq!(reopened.len(), 1);
    }
}
