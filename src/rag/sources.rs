// Citation accumulation for answered queries

use crate::types::{Citation, RetrievalResult};

/// Snippet length for the streaming (network) interface.
pub const STREAM_SNIPPET_CHARS: usize = 300;
/// Snippet length for the interactive console.
pub const CONSOLE_SNIPPET_CHARS: usize = 100;

/// Holds one citation per retrieved chunk, in retrieval order, emitted once
/// after all tokens for a query have streamed. Pages cited by multiple chunks
/// appear multiple times.
pub struct SourceAttributor {
    citations: Vec<Citation>,
}

impl SourceAttributor {
    pub fn new(results: &[RetrievalResult], snippet_chars: usize) -> Self {
        let citations = results
            .iter()
            .map(|result| Citation {
                // Internal page numbers are 0-indexed.
                page: result.page + 1,
                snippet: snippet(&result.chunk_text, snippet_chars),
            })
            .collect();
        Self { citations }
    }

    pub fn finish(self) -> Vec<Citation> {
        self.citations
    }
}

fn snippet(text: &str, max_chars: usize) -> String {
    let mut excerpt: String = text.chars().take(max_chars).collect();
    excerpt.push_str("...");
    excerpt
}
