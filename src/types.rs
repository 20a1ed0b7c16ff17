// Shared type definitions for the RAG pipeline

use serde::{Deserialize, Serialize};

/// One page of the source document, 0-indexed in physical order.
#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    pub text: String,
}

/// A bounded span of page text with provenance back to its page.
///
/// `sequence` is the chunk's position within the split of its page.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub source_page: usize,
    pub sequence: usize,
}

/// A single nearest-neighbor hit, ordered by descending similarity.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub chunk_text: String,
    pub page: usize,
    pub score: f32,
}

/// User-facing citation. `page` is 1-indexed; internal page numbers are
/// 0-indexed, so attribution adds 1 when building these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub page: usize,
    #[serde(rename = "text")]
    pub snippet: String,
}

/// Event produced by the answer stream: zero or more `Token`s followed by
/// exactly one `SourcesReady`. A generation failure terminates the stream
/// without a `SourcesReady`.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Token(String),
    SourcesReady(Vec<Citation>),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Failed to parse document: {0}")]
    Parse(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Index build error: {0}")]
    IndexBuild(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("System not ready: {0}")]
    NotReady(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
