//! Vector store trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for chunk embeddings with cosine similarity search.
///
/// Implementations manage named collections of [`Chunk`]s keyed by
/// [`Chunk::id`], so upserting the same chunk twice leaves a single entry.
/// Failures are reported as [`RagError::IndexUnavailable`](crate::RagError::IndexUnavailable).
///
/// # Example
///
/// ```rust,ignore
/// use medbot_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("medical-chatbot", 384).await?;
/// store.upsert("medical-chatbot", &chunks).await?;
/// let results = store.search("medical-chatbot", &query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named cosine collection of the given dimension. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data. No-op if it does not exist.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Upsert chunks into a collection. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Search for at most `top_k` chunks most similar to the given embedding.
    ///
    /// Returns results ordered by descending similarity score. An empty
    /// collection yields an empty `Vec`, never an error.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}
