use crate::models::{AppState, HealthResponse};
use axum::{extract::State, routing::get, Json, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let response = HealthResponse {
        status: if state.engine.is_some() {
            "ok".to_string()
        } else {
            "not_ready".to_string()
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
        index_entries: state.engine.as_ref().map(|engine| engine.index_len()),
    };

    Json(response)
}
