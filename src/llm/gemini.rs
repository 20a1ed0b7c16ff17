// Google Gemini adapter (Generative Language API)
// Embeddings: POST {base}/{model}:embedContent and :batchEmbedContents
// Generation: POST {base}/models/{model}:streamGenerateContent?alt=sse
// API Reference: https://ai.google.dev/api

use crate::llm::provider::{EmbeddingProvider, GenerationProvider};
use crate::types::{AppError, AppResult};
use crate::utils::retry::with_retry;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// The batch embedding endpoint rejects more than 100 contents per call.
const EMBED_BATCH_LIMIT: usize = 100;

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    generation_model: String,
    embedding_model: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct EmbedContentRequest {
    content: ContentParts,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<BatchEmbedItem>,
}

#[derive(Serialize)]
struct BatchEmbedItem {
    model: String,
    content: ContentParts,
}

#[derive(Serialize)]
struct ContentParts {
    parts: Vec<TextPart>,
}

#[derive(Serialize, Deserialize)]
struct TextPart {
    text: String,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<GenerateContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerateContent {
    role: String,
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct GenerationConfig {
    // Fixed at 0 to bias toward deterministic answers.
    temperature: f32,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<StreamCandidate>,
}

#[derive(Deserialize)]
struct StreamCandidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

impl StreamChunk {
    fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .map(|p| p.text.as_str())
            .collect()
    }
}

impl GeminiClient {
    pub fn new(
        api_key: &str,
        generation_model: &str,
        embedding_model: &str,
        max_retries: u32,
    ) -> Self {
        Self::with_base_url(
            api_key,
            generation_model,
            embedding_model,
            max_retries,
            GEMINI_API_BASE,
        )
    }

    /// Adapter pointed at a non-default endpoint. Used by tests against a
    /// local mock server.
    pub fn with_base_url(
        api_key: &str,
        generation_model: &str,
        embedding_model: &str,
        max_retries: u32,
        base_url: &str,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            generation_model: generation_model.to_string(),
            embedding_model: embedding_model.to_string(),
            max_retries,
        }
    }

    fn embed_url(&self, action: &str) -> String {
        // Embedding model names already carry the "models/" prefix.
        format!("{}/{}:{}", self.base_url, self.embedding_model, action)
    }

    async fn embed_batch_page(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| BatchEmbedItem {
                    model: self.embedding_model.clone(),
                    content: ContentParts {
                        parts: vec![TextPart { text: text.clone() }],
                    },
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.embed_url("batchEmbedContents"))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::EmbeddingService(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingService(format!(
                "batch embedding failed ({status}): {body}"
            )));
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::EmbeddingService(format!("malformed response: {e}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(AppError::EmbeddingService(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        with_retry(
            || async {
                let request = EmbedContentRequest {
                    content: ContentParts {
                        parts: vec![TextPart {
                            text: text.to_string(),
                        }],
                    },
                };

                let response = self
                    .client
                    .post(self.embed_url("embedContent"))
                    .header("x-goog-api-key", &self.api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| AppError::EmbeddingService(format!("request failed: {e}")))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::EmbeddingService(format!(
                        "embedding failed ({status}): {body}"
                    )));
                }

                let parsed: EmbedContentResponse = response
                    .json()
                    .await
                    .map_err(|e| AppError::EmbeddingService(format!("malformed response: {e}")))?;

                Ok(parsed.embedding.values)
            },
            self.max_retries,
        )
        .await
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for page in texts.chunks(EMBED_BATCH_LIMIT) {
            let batch = with_retry(|| self.embed_batch_page(page), self.max_retries).await?;
            vectors.extend(batch);
        }
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn stream_completion(
        &self,
        prompt: &str,
    ) -> AppResult<BoxStream<'static, AppResult<String>>> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.generation_model
        );

        let request = GenerateRequest {
            contents: vec![GenerateContent {
                role: "user".to_string(),
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig { temperature: 0.0 },
        };

        // Retry only applies to establishing the stream; mid-stream failures
        // terminate the sequence.
        let response = with_retry(
            || async {
                let response = self
                    .client
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| AppError::Generation(format!("request failed: {e}")))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::Generation(format!(
                        "generation failed ({status}): {body}"
                    )));
                }

                Ok(response)
            },
            self.max_retries,
        )
        .await?;

        Ok(sse_token_stream(response))
    }
}

struct SseState {
    bytes: BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    // Raw bytes: a multi-byte character may arrive split across transport
    // chunks, so decoding happens per complete line, not per chunk.
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    error: Option<AppError>,
    done: bool,
}

impl SseState {
    /// Drains complete `data:` lines out of the buffer into pending tokens.
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end();
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }
            match serde_json::from_str::<StreamChunk>(data) {
                Ok(chunk) => {
                    let text = chunk.text();
                    if !text.is_empty() {
                        self.pending.push_back(text);
                    }
                }
                Err(e) => {
                    self.error = Some(AppError::Generation(format!(
                        "malformed stream payload: {e}"
                    )));
                    self.done = true;
                    return;
                }
            }
        }
    }
}

/// Turns an SSE response body into a stream of token texts. Tokens decoded
/// before a transport failure are still delivered; the failure then ends the
/// stream. Dropping the stream drops the HTTP response and cancels the call.
fn sse_token_stream(response: reqwest::Response) -> BoxStream<'static, AppResult<String>> {
    let state = SseState {
        bytes: response.bytes_stream().boxed(),
        buffer: Vec::new(),
        pending: VecDeque::new(),
        error: None,
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(token) = state.pending.pop_front() {
                return Some((Ok(token), state));
            }
            if let Some(error) = state.error.take() {
                return Some((Err(error), state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(&chunk);
                    state.drain_lines();
                }
                Some(Err(e)) => {
                    state.error = Some(AppError::Generation(format!("stream failed: {e}")));
                    state.done = true;
                }
                None => {
                    // Flush a final data line that arrived without a newline.
                    state.buffer.push(b'\n');
                    state.drain_lines();
                    state.done = true;
                }
            }
        }
    })
    .boxed()
}
