// Recursive character splitting with overlap

use crate::types::{Chunk, Page};
use std::collections::VecDeque;

// Decreasing granularity: paragraph, line, sentence, then hard character cut.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", ". "];

/// Splits page text into bounded, overlapping chunks. Sizes are measured in
/// characters. Deterministic for fixed input and parameters.
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    /// Splits every page, preserving page provenance. An empty or
    /// whitespace-only page produces no chunks.
    pub fn split(&self, pages: &[Page]) -> Vec<Chunk> {
        pages
            .iter()
            .flat_map(|page| {
                self.split_page(&page.text)
                    .into_iter()
                    .enumerate()
                    .map(|(sequence, text)| Chunk {
                        text,
                        source_page: page.index,
                        sequence,
                    })
            })
            .collect()
    }

    fn split_page(&self, text: &str) -> Vec<String> {
        let pieces = self.split_pieces(text, &SEPARATORS);
        self.merge_pieces(pieces)
    }

    /// Breaks text into spans no longer than `chunk_size`, trying each
    /// separator in turn and hard-cutting at character boundaries as a last
    /// resort. Separators stay attached to the end of their piece so merged
    /// chunks read contiguously.
    fn split_pieces(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some((separator, rest)) = separators.split_first() else {
            return hard_cut(text, self.chunk_size);
        };
        if !text.contains(separator) {
            return self.split_pieces(text, rest);
        }

        let mut pieces = Vec::new();
        for part in text.split_inclusive(separator) {
            if char_len(part) > self.chunk_size {
                pieces.extend(self.split_pieces(part, rest));
            } else {
                pieces.push(part.to_string());
            }
        }
        pieces
    }

    /// Greedily packs pieces into chunks of at most `chunk_size` characters,
    /// carrying a trailing window of up to `chunk_overlap` characters of whole
    /// pieces into the next chunk.
    fn merge_pieces(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(String, usize)> = VecDeque::new();
        let mut window_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);
            if window_len + piece_len > self.chunk_size && !window.is_empty() {
                push_chunk(&mut chunks, &window);
                while window_len > self.chunk_overlap
                    || (window_len + piece_len > self.chunk_size && window_len > 0)
                {
                    match window.pop_front() {
                        Some((_, front_len)) => window_len -= front_len,
                        None => break,
                    }
                }
            }
            window_len += piece_len;
            window.push_back((piece, piece_len));
        }

        push_chunk(&mut chunks, &window);
        chunks
    }
}

fn push_chunk(chunks: &mut Vec<String>, window: &VecDeque<(String, usize)>) {
    let joined: String = window.iter().map(|(piece, _)| piece.as_str()).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn hard_cut(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|span| span.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: usize, text: &str) -> Page {
        Page {
            index,
            text: text.to_string(),
        }
    }

    #[test]
    fn short_page_is_a_single_chunk() {
        let chunker = Chunker::new(1000, 100);
        let chunks = chunker.split(&[page(0, "Total net sales were $391 billion.")]);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Total net sales were $391 billion.");
        assert_eq!(chunks[0].source_page, 0);
        assert_eq!(chunks[0].sequence, 0);
    }

    #[test]
    fn chunks_respect_size_bound() {
        let chunker = Chunker::new(50, 10);
        let text = "Revenue grew in every segment this year. Services reached a new high. \
                    Hardware margins held steady. Operating expenses rose modestly. \
                    The board declared a dividend.";
        let chunks = chunker.split(&[page(0, text)]);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 50, "oversized: {:?}", chunk.text);
        }
    }

    #[test]
    fn sentence_split_with_overlap_shares_trailing_pieces() {
        let chunker = Chunker::new(20, 8);
        let chunks = chunker.split(&[page(0, "aaaa. bbbb. cccc. dddd. eeee.")]);

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaa. bbbb. cccc.", "cccc. dddd. eeee."]);
    }

    #[test]
    fn adjacent_chunks_overlap_up_to_separator_rounding() {
        let chunker = Chunker::new(80, 25);
        let text = "Alpha statement one. Beta statement two. Gamma statement three. \
                    Delta statement four. Epsilon statement five. Zeta statement six.";
        let chunks = chunker.split(&[page(0, text)]);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            // The later chunk opens with a piece carried over from the tail of
            // the earlier chunk.
            let head: String = pair[1].text.chars().take(10).collect();
            assert!(
                pair[0].text.contains(head.trim_end()),
                "no overlap between {:?} and {:?}",
                pair[0].text,
                pair[1].text
            );
        }
    }

    #[test]
    fn paragraphs_are_preferred_over_lines() {
        let chunker = Chunker::new(30, 5);
        let text = "First paragraph here.\n\nSecond paragraph over there.";
        let chunks = chunker.split(&[page(0, text)]);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "First paragraph here.");
        assert_eq!(chunks[1].text, "Second paragraph over there.");
    }

    #[test]
    fn indivisible_span_is_hard_cut_at_character_boundary() {
        let chunker = Chunker::new(10, 2);
        let chunks = chunker.split(&[page(0, "abcdefghijklmnopqrstuvwxyz")]);

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcdefghij", "klmnopqrst", "uvwxyz"]);
    }

    #[test]
    fn empty_and_whitespace_pages_produce_no_chunks() {
        let chunker = Chunker::new(1000, 100);
        let chunks = chunker.split(&[page(0, ""), page(1, "  \n\n \t ")]);
        assert!(chunks.is_empty());
    }

    #[test]
    fn page_provenance_and_sequence_are_tracked() {
        let chunker = Chunker::new(20, 4);
        let chunks = chunker.split(&[
            page(0, "one. two. three. four. five. six."),
            page(1, "short page"),
        ]);

        let page0: Vec<&Chunk> = chunks.iter().filter(|c| c.source_page == 0).collect();
        let page1: Vec<&Chunk> = chunks.iter().filter(|c| c.source_page == 1).collect();
        assert!(page0.len() > 1);
        assert_eq!(page1.len(), 1);
        for (i, chunk) in page0.iter().enumerate() {
            assert_eq!(chunk.sequence, i);
        }
        assert_eq!(page1[0].sequence, 0);
    }

    #[test]
    fn splitting_is_deterministic() {
        let chunker = Chunker::new(60, 12);
        let text = "Gross margin expanded.\nOperating income rose.\n\nCash flow stayed strong. \
                    Buybacks continued at pace. Guidance was reaffirmed for the year.";
        let first = chunker.split(&[page(0, text)]);
        let second = chunker.split(&[page(0, text)]);
        assert_eq!(first, second);
    }
}
