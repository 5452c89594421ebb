//! Data types for documents, chunks, search results, and chat exchanges.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text extracted from one source file (or one page of it).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// The text content of the document.
    pub text: String,
    /// Path of the file the text came from.
    pub source: String,
    /// 1-based page number when the document is a single PDF page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl Document {
    /// Create a document that is not tied to a particular page.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self { text: text.into(), source: source.into(), page: None }
    }

    /// Tag the document with a 1-based page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// A bounded substring of a [`Document`], the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Deterministic identifier, see [`chunk_id`].
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Source path inherited from the parent document.
    pub source: String,
    /// Page number inherited from the parent document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Character offset of the chunk inside the parent document's text.
    pub offset: usize,
    /// The vector embedding for this chunk's text. Empty until the pipeline embeds it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create an un-embedded chunk of `document` starting at character `offset`.
    pub fn new(document: &Document, offset: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: chunk_id(&document.source, document.page, offset, &text),
            text,
            source: document.source.clone(),
            page: document.page,
            offset,
            embedding: Vec::new(),
        }
    }
}

/// Derive the upsert key of a chunk.
///
/// The key is a UUID v5 over source, page, offset and text, so ingesting the
/// same corpus twice overwrites the same index entries, while any change in
/// content or position produces a new entry.
pub fn chunk_id(source: &str, page: Option<u32>, offset: usize, text: &str) -> String {
    let page = page.map(|p| p.to_string()).unwrap_or_default();
    let key = format!("{source}\0{page}\0{offset}\0{text}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
}

/// The outcome of answering one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatExchange {
    pub question: String,
    pub answer: String,
    /// Distinct source paths of the chunks handed to the model, in retrieval order.
    pub context_used: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_stable_and_content_sensitive() {
        let a = chunk_id("data/a.pdf", Some(1), 0, "Aspirin reduces fever.");
        let b = chunk_id("data/a.pdf", Some(1), 0, "Aspirin reduces fever.");
        let c = chunk_id("data/a.pdf", Some(2), 0, "Aspirin reduces fever.");
        let d = chunk_id("data/a.pdf", Some(1), 0, "Aspirin reduces pain.");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn chunk_inherits_source_and_page() {
        let doc = Document::new("data/a.pdf", "text").with_page(3);
        let chunk = Chunk::new(&doc, 0, "text");
        assert_eq!(chunk.source, "data/a.pdf");
        assert_eq!(chunk.page, Some(3));
        assert!(chunk.embedding.is_empty());
    }
}
