//! API Routes
//!
//! - `POST /chat` - Streaming NDJSON answer endpoint
//! - `GET /api/health` - Health and readiness check
//! - `/` - Static file serving (frontend)

pub mod chat;
pub mod health;
pub mod static_files;

use crate::models::AppState;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the main application router. API routes take precedence over
/// static files.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let api_router = Router::new()
        .merge(chat::router(state.clone()))
        .merge(health::router(state));

    Router::new()
        .merge(api_router)
        .merge(static_files::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
