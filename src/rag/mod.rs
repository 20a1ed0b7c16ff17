// Retrieval-augmented generation pipeline

pub mod chunker;
pub mod engine;
pub mod index;
pub mod loader;
pub mod prompt;
pub mod retriever;
pub mod sources;

pub use chunker::Chunker;
pub use engine::RagEngine;
pub use index::VectorIndex;
pub use retriever::Retriever;
