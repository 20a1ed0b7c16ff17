use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub ingest: IngestConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub google_api_key: String,
    pub generation_model: String,
    pub embedding_model: String,
    /// Retries after the first failed attempt, for both embedding and
    /// generation calls.
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    pub document_path: String,
    pub index_path: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Character budget for the assembled prompt; lowest-ranked chunks are
    /// dropped first when the context would exceed it.
    pub max_prompt_chars: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            },
            llm: LlmConfig {
                google_api_key: env::var("GOOGLE_API_KEY").unwrap_or_default(),
                generation_model: env::var("GENERATION_MODEL")
                    .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
                embedding_model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "models/embedding-001".to_string()),
                max_retries: env::var("LLM_MAX_RETRIES")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()?,
            },
            ingest: IngestConfig {
                document_path: env::var("DOCUMENT_PATH")
                    .unwrap_or_else(|_| "data/apple_10k_2025.pdf".to_string()),
                index_path: env::var("INDEX_PATH")
                    .unwrap_or_else(|_| "filing_index.json".to_string()),
                chunk_size: env::var("CHUNK_SIZE")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()?,
                chunk_overlap: env::var("CHUNK_OVERLAP")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()?,
            },
            retrieval: RetrievalConfig {
                top_k: env::var("RETRIEVAL_K")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                max_prompt_chars: env::var("MAX_PROMPT_CHARS")
                    .unwrap_or_else(|_| "24000".to_string())
                    .parse()?,
            },
        })
    }
}
