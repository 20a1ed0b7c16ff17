// Filing Analyst - retrieval-augmented Q&A over annual report filings

pub mod config;
pub mod console;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod rag;
pub mod routes;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
