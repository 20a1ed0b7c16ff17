// Grounded prompt assembly

use crate::types::RetrievalResult;

const SYSTEM_INSTRUCTION: &str = "You are an expert financial analyst. \
Use the following context to answer the question.\n\
If the answer is not in the context, say \"I don't know\" or \"The document doesn't mention this.\"\n\
Keep your answers concise and professional.";

/// Combines the system instruction, retrieved context, and the verbatim user
/// question into one prompt.
pub struct PromptAssembler {
    max_prompt_chars: usize,
}

impl PromptAssembler {
    pub fn new(max_prompt_chars: usize) -> Self {
        Self { max_prompt_chars }
    }

    /// Context chunks appear in retrieval order (descending relevance) with
    /// no deduplication. When the assembled prompt would exceed the character
    /// budget, lowest-ranked chunks are dropped first; the question itself is
    /// never dropped.
    pub fn assemble(&self, question: &str, results: &[RetrievalResult]) -> String {
        let mut kept = results.len();
        loop {
            let prompt = render(question, &results[..kept]);
            if kept == 0 || prompt.chars().count() <= self.max_prompt_chars {
                return prompt;
            }
            kept -= 1;
        }
    }
}

fn render(question: &str, results: &[RetrievalResult]) -> String {
    let context = results
        .iter()
        .map(|r| r.chunk_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{SYSTEM_INSTRUCTION}\n\nContext:\n{context}\n\nQuestion:\n{question}\n")
}
