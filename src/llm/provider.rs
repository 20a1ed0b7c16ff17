use crate::types::AppResult;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Maps text to fixed-dimension vectors via an external embedding service.
///
/// All vectors produced within one ingestion run and one query run must come
/// from the same model; the index records the model name so a switch is
/// visible at open time.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Embeds a batch of texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    fn model_name(&self) -> &str;
}

/// Streams model output for an assembled prompt.
///
/// The returned sequence is finite and not restartable; a fresh call
/// re-invokes the underlying service.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn stream_completion(&self, prompt: &str)
        -> AppResult<BoxStream<'static, AppResult<String>>>;
}
