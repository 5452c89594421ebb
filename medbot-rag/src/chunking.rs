//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits text hierarchically (paragraphs, lines, sentences, words, then
//! characters) into windows of at most `chunk_size` characters, carrying up to
//! `chunk_overlap` characters from the end of one chunk into the next.

use std::collections::VecDeque;
use std::ops::Range;

use crate::config::RagConfig;
use crate::document::{Chunk, Document};

/// Separators tried in order. The empty separator means "split into characters".
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " ", ""];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and provenance but no embeddings.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks, left to right.
    ///
    /// Returns an empty `Vec` if the document has no non-whitespace text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Split several documents, keeping document order and in-document order.
    fn chunk_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|document| self.chunk(document)).collect()
    }
}

/// Splits text hierarchically, preferring the coarsest separator that fits.
///
/// The text is cut at the first separator of `\n\n`, `\n`, `. `, `! `, `? `,
/// ` ` that occurs in it, keeping each separator attached to the piece before
/// it. Pieces that fit are merged greedily into chunks of at most
/// `chunk_size` characters; when a chunk is emitted, trailing pieces totalling
/// at most `chunk_overlap` characters are carried into the next chunk. Pieces
/// that are still too long are split again with the next separator, down to
/// single characters, where the window advances by exactly
/// `chunk_size - chunk_overlap` characters.
///
/// Chunk text is never trimmed, so every chunk is an exact substring of its
/// document starting at [`Chunk::offset`].
///
/// # Example
///
/// ```rust,ignore
/// use medbot_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(500, 20);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk (at least 1)
    /// * `chunk_overlap` - characters shared between consecutive chunks,
    ///   clamped below `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }

    /// Create a chunker from a validated [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split `span` of `text` into byte ranges of at most `chunk_size` characters.
    fn split(&self, text: &str, span: Range<usize>, separators: &[&str]) -> Vec<Range<usize>> {
        if char_len(text, &span) <= self.chunk_size {
            return vec![span];
        }

        let slice = &text[span.clone()];
        let position =
            separators.iter().position(|sep| !sep.is_empty() && slice.contains(sep));
        let (pieces, remaining) = match position {
            Some(i) => (split_keeping_separator(text, span, separators[i]), &separators[i + 1..]),
            None => (split_chars(text, span), &[][..]),
        };

        let mut spans = Vec::new();
        let mut pending = Vec::new();
        for piece in pieces {
            if char_len(text, &piece) <= self.chunk_size {
                pending.push(piece);
            } else {
                spans.extend(self.merge(text, &pending));
                pending.clear();
                spans.extend(self.split(text, piece, remaining));
            }
        }
        spans.extend(self.merge(text, &pending));
        spans
    }

    /// Merge contiguous pieces into windows, carrying overlap between windows.
    fn merge(&self, text: &str, pieces: &[Range<usize>]) -> Vec<Range<usize>> {
        let mut merged = Vec::new();
        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(text, piece);
            if total + len > self.chunk_size {
                if let (Some((first, _)), Some((last, _))) = (window.front(), window.back()) {
                    merged.push(first.start..last.end);
                }
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece.clone(), len));
            total += len;
        }

        if let (Some((first, _)), Some((last, _))) = (window.front(), window.back()) {
            merged.push(first.start..last.end);
        }
        merged
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.text;
        if text.trim().is_empty() {
            return Vec::new();
        }

        let spans = self.split(text, 0..text.len(), SEPARATORS);

        // Span starts never decrease, so character offsets are counted incrementally.
        let mut chunks = Vec::with_capacity(spans.len());
        let mut cursor = 0;
        let mut offset = 0;
        for span in spans {
            offset += text[cursor..span.start].chars().count();
            cursor = span.start;

            let chunk_text = &text[span];
            if chunk_text.trim().is_empty() {
                continue;
            }
            chunks.push(Chunk::new(document, offset, chunk_text));
        }
        chunks
    }
}

fn char_len(text: &str, span: &Range<usize>) -> usize {
    text[span.clone()].chars().count()
}

/// Split at a separator while keeping the separator attached to the preceding piece.
fn split_keeping_separator(text: &str, span: Range<usize>, separator: &str) -> Vec<Range<usize>> {
    let slice = &text[span.clone()];
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = slice[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(span.start + start..span.start + end);
        start = end;
    }

    if start < slice.len() {
        result.push(span.start + start..span.end);
    }

    result
}

fn split_chars(text: &str, span: Range<usize>) -> Vec<Range<usize>> {
    text[span.clone()]
        .char_indices()
        .map(|(i, c)| span.start + i..span.start + i + c.len_utf8())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("data/test.pdf", text)
    }

    #[test]
    fn short_document_yields_single_identical_chunk() {
        let chunks = RecursiveChunker::new(100, 10).chunk(&doc("Aspirin reduces fever."));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Aspirin reduces fever.");
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(chunks[0].source, "data/test.pdf");
    }

    #[test]
    fn blank_document_yields_nothing() {
        assert!(RecursiveChunker::new(100, 10).chunk(&doc("")).is_empty());
        assert!(RecursiveChunker::new(100, 10).chunk(&doc(" \n\n ")).is_empty());
    }

    #[test]
    fn unbroken_text_advances_by_size_minus_overlap() {
        let text = "abcdefghijklmnopqrstuvwxy";
        let chunks = RecursiveChunker::new(10, 3).chunk(&doc(text));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcdefghij", "hijklmnopq", "opqrstuvwx", "vwxy"]);
        let offsets: Vec<usize> = chunks.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 7, 14, 21]);
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = RecursiveChunker::new(25, 0).chunk(&doc(text));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "First paragraph here.\n\n");
        assert_eq!(chunks[1].text, "Second paragraph here.");
        assert_eq!(chunks[1].offset, 23);
    }

    #[test]
    fn does_not_split_inside_words_when_spaces_exist() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = RecursiveChunker::new(12, 0).chunk(&doc(text));
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 12);
            let word = chunk.text.trim();
            assert!(!word.is_empty());
            for part in word.split(' ') {
                assert!(text.split(' ').any(|w| w == part), "split inside word: {part:?}");
            }
        }
    }

    #[test]
    fn handles_multibyte_characters() {
        let text = "çğıöşü".repeat(20);
        let chunks = RecursiveChunker::new(7, 2).chunk(&doc(&text));
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 7));
        let last = chunks.last().unwrap();
        assert_eq!(last.offset + last.text.chars().count(), text.chars().count());
    }

    #[test]
    fn chunk_all_preserves_document_order() {
        let docs = vec![
            Document::new("a.pdf", "one two three four five six"),
            Document::new("b.pdf", "seven eight"),
        ];
        let chunks = RecursiveChunker::new(10, 0).chunk_all(&docs);
        let first_b = chunks.iter().position(|c| c.source == "b.pdf").unwrap();
        assert!(chunks[..first_b].iter().all(|c| c.source == "a.pdf"));
        assert!(chunks[first_b..].iter().all(|c| c.source == "b.pdf"));
        assert!(
            chunks
                .windows(2)
                .filter(|w| w[0].source == w[1].source)
                .all(|w| w[0].offset < w[1].offset)
        );
    }

    #[test]
    fn overlap_is_clamped_below_size() {
        let chunker = RecursiveChunker::new(5, 9);
        let chunks = chunker.chunk(&doc("abcdefghij"));
        assert!(chunks.len() > 1);
        assert!(chunks.windows(2).all(|w| w[0].offset < w[1].offset));
    }
}
