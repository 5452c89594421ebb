//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// Dimensionality of the sentence-transformer models the index is built for.
pub const EMBEDDING_DIMENSIONS: usize = 384;

/// A provider that generates vector embeddings from text input.
///
/// Implementations must be deterministic: the same text always maps to the
/// same vector, and [`embed_batch`](EmbeddingProvider::embed_batch) must agree
/// with [`embed`](EmbeddingProvider::embed) item by item. The default
/// `embed_batch` calls `embed` sequentially; backends that support native
/// batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use medbot_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Return the versioned model identifier, used in logs and errors.
    fn model_id(&self) -> &str;
}
