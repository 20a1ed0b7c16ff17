use crate::config::Config;
use crate::rag::RagEngine;
use crate::types::Citation;
use std::sync::Arc;

/// Shared application state. `engine` is `None` until an index has been
/// built and opened; handlers report "not ready" while it is absent.
#[derive(Clone)]
pub struct AppState {
    pub engine: Option<Arc<RagEngine>>,
    pub config: Config,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// One line of the NDJSON answer stream.
#[derive(Debug, serde::Serialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum StreamRecord {
    Token(String),
    Sources(Vec<Citation>),
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorRecord {
    pub error: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub index_entries: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_records_match_the_wire_format() {
        let token = serde_json::to_string(&StreamRecord::Token("Net".to_string())).unwrap();
        assert_eq!(token, r#"{"type":"token","content":"Net"}"#);

        let sources = serde_json::to_string(&StreamRecord::Sources(vec![Citation {
            page: 12,
            snippet: "Total net sales...".to_string(),
        }]))
        .unwrap();
        assert_eq!(
            sources,
            r#"{"type":"sources","content":[{"page":12,"text":"Total net sales..."}]}"#
        );
    }
}
