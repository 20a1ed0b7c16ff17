use crate::models::{AppState, ErrorRecord, QueryRequest, StreamRecord};
use crate::types::{AppError, GenerationEvent};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use futures::StreamExt;
use std::convert::Infallible;
use tracing::{error, info};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(post_chat))
        .with_state(state)
}

/// Streams the answer as newline-delimited JSON: `token` records as the model
/// produces output, then exactly one `sources` record. A mid-stream failure
/// ends the body with an `error` record instead of sources.
async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Response {
    let Some(engine) = state.engine.clone() else {
        return error_response(&AppError::NotReady(
            "no index loaded; run `filing-analyst ingest` first".to_string(),
        ));
    };

    info!(query = %request.query, "Received chat query");

    let events = match engine.answer_stream(&request.query).await {
        Ok(events) => events,
        Err(e) => {
            error!(error = %e, "Query failed before streaming");
            return error_response(&e);
        }
    };

    let lines = events.map(|event| {
        let record = match event {
            Ok(GenerationEvent::Token(text)) => serde_json::to_string(&StreamRecord::Token(text)),
            Ok(GenerationEvent::SourcesReady(citations)) => {
                serde_json::to_string(&StreamRecord::Sources(citations))
            }
            Err(e) => {
                error!(error = %e, "Stream terminated early");
                serde_json::to_string(&ErrorRecord {
                    error: e.to_string(),
                })
            }
        };
        let mut line = record.unwrap_or_else(|_| String::from("{}"));
        line.push('\n');
        Ok::<_, Infallible>(Bytes::from(line))
    });

    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response()
}

fn error_response(error: &AppError) -> Response {
    let status = match error {
        AppError::NotReady(_) | AppError::IndexNotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
        AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, IngestConfig, LlmConfig, RetrievalConfig, ServerConfig};

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
            },
            llm: LlmConfig {
                google_api_key: String::new(),
                generation_model: "gemini-2.5-flash".to_string(),
                embedding_model: "models/embedding-001".to_string(),
                max_retries: 2,
            },
            ingest: IngestConfig {
                document_path: "unused.pdf".to_string(),
                index_path: "unused.json".to_string(),
                chunk_size: 1000,
                chunk_overlap: 100,
            },
            retrieval: RetrievalConfig {
                top_k: 5,
                max_prompt_chars: 24_000,
            },
        }
    }

    #[tokio::test]
    async fn query_without_index_is_not_ready_with_no_tokens() {
        let state = AppState {
            engine: None,
            config: test_config(),
        };

        let response = post_chat(
            State(state),
            Json(QueryRequest {
                query: "what were net sales?".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .contains("System not ready"));
        assert!(!String::from_utf8_lossy(&body).contains("\"token\""));
    }
}
