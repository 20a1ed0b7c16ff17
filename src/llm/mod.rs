// LLM provider integration

pub mod gemini;
pub mod provider;

pub use gemini::GeminiClient;
pub use provider::{EmbeddingProvider, GenerationProvider};
