//! Static File Serving
//!
//! Serves the chat frontend from the `static/` directory.

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

pub fn router() -> Router {
    let serve_dir = ServeDir::new("static").append_index_html_on_directories(true);

    Router::new()
        .route("/", get(serve_index))
        .fallback_service(serve_dir)
}

async fn serve_index() -> impl IntoResponse {
    match tokio::fs::read_to_string("static/index.html").await {
        Ok(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            content,
        )
            .into_response(),
        Err(_) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            FALLBACK_HTML.to_string(),
        )
            .into_response(),
    }
}

const FALLBACK_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Filing Analyst - API Server</title>
</head>
<body>
    <h1>Filing Analyst</h1>
    <p>The API server is running, but the frontend bundle was not found.</p>
    <ul>
        <li><code>GET /api/health</code> - Health check</li>
        <li><code>POST /chat</code> - Streaming question answering</li>
    </ul>
    <pre>curl -N -X POST http://localhost:8000/chat \
  -H "Content-Type: application/json" \
  -d '{"query": "What were total net sales?"}'</pre>
</body>
</html>"#;
