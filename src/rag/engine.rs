// Query-time RAG pipeline: retrieve, assemble, generate, attribute

use crate::config::RetrievalConfig;
use crate::llm::provider::{EmbeddingProvider, GenerationProvider};
use crate::rag::index::VectorIndex;
use crate::rag::prompt::PromptAssembler;
use crate::rag::retriever::Retriever;
use crate::rag::sources::{SourceAttributor, CONSOLE_SNIPPET_CHARS, STREAM_SNIPPET_CHARS};
use crate::types::{AppResult, Citation, GenerationEvent};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tracing::info;

/// Lifecycle object constructed at startup from a successfully opened index.
/// Its presence is the system's readiness signal; request handlers receive it
/// by handle instead of consulting global state.
pub struct RagEngine {
    index: Arc<VectorIndex>,
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: Arc<dyn GenerationProvider>,
}

impl RagEngine {
    pub fn new(
        index: VectorIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        retrieval: &RetrievalConfig,
    ) -> Self {
        let index = Arc::new(index);
        let retriever = Retriever::new(index.clone(), embedder, retrieval.top_k);
        Self {
            index,
            retriever,
            assembler: PromptAssembler::new(retrieval.max_prompt_chars),
            generator,
        }
    }

    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// Streams the answer for one query: zero or more `Token` events, then
    /// exactly one `SourcesReady`. A generation failure terminates the stream
    /// with the error and no sources event.
    pub async fn answer_stream(
        &self,
        query: &str,
    ) -> AppResult<BoxStream<'static, AppResult<GenerationEvent>>> {
        info!(query_len = query.len(), "Answering query (streaming)");

        let results = self.retriever.retrieve(query).await?;
        let prompt = self.assembler.assemble(query, &results);
        let tokens = self.generator.stream_completion(&prompt).await?;
        let attributor = SourceAttributor::new(&results, STREAM_SNIPPET_CHARS);

        Ok(event_stream(tokens, attributor))
    }

    /// Fully buffered variant for the interactive console.
    pub async fn answer(&self, query: &str) -> AppResult<(String, Vec<Citation>)> {
        info!(query_len = query.len(), "Answering query (buffered)");

        let results = self.retriever.retrieve(query).await?;
        let prompt = self.assembler.assemble(query, &results);
        let mut tokens = self.generator.stream_completion(&prompt).await?;

        let mut answer = String::new();
        while let Some(token) = tokens.next().await {
            answer.push_str(&token?);
        }

        let citations = SourceAttributor::new(&results, CONSOLE_SNIPPET_CHARS).finish();
        Ok((answer, citations))
    }
}

enum StreamState {
    Streaming {
        tokens: BoxStream<'static, AppResult<String>>,
        attributor: SourceAttributor,
    },
    Done,
}

fn event_stream(
    tokens: BoxStream<'static, AppResult<String>>,
    attributor: SourceAttributor,
) -> BoxStream<'static, AppResult<GenerationEvent>> {
    futures::stream::unfold(
        StreamState::Streaming { tokens, attributor },
        |state| async move {
            match state {
                StreamState::Streaming {
                    mut tokens,
                    attributor,
                } => match tokens.next().await {
                    Some(Ok(text)) => Some((
                        Ok(GenerationEvent::Token(text)),
                        StreamState::Streaming { tokens, attributor },
                    )),
                    Some(Err(e)) => Some((Err(e), StreamState::Done)),
                    None => Some((
                        Ok(GenerationEvent::SourcesReady(attributor.finish())),
                        StreamState::Done,
                    )),
                },
                StreamState::Done => None,
            }
        },
    )
    .boxed()
}
