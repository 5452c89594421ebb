//! Retrieval pipeline.
//!
//! The [`RagPipeline`] binds an [`EmbeddingProvider`], a [`VectorStore`],
//! a [`Chunker`] and one named collection. It covers both directions of the
//! index: ingestion (chunk → embed → upsert) and retrieval (embed → search →
//! threshold filter).
//!
//! # Example
//!
//! ```rust,ignore
//! use medbot_rag::{RagPipeline, RagConfig, InMemoryVectorStore, RecursiveChunker};
//!
//! let config = RagConfig::default();
//! let pipeline = RagPipeline::builder()
//!     .chunker(Arc::new(RecursiveChunker::from_config(&config)))
//!     .config(config)
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .collection("medical-chatbot")
//!     .build()?;
//!
//! pipeline.ensure_index().await?;
//! pipeline.ingest(&documents).await?;
//! let results = pipeline.query("What does aspirin do?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// The collection name used when none is configured.
pub const DEFAULT_COLLECTION: &str = "medical-chatbot";

const EMBED_BATCH_SIZE: usize = 64;

/// The retrieval pipeline over a single collection.
///
/// Errors from collaborators are logged and propagated with their original
/// [`ErrorKind`](crate::ErrorKind). Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    collection: String,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return the name of the collection this pipeline reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the collection if it does not exist yet, sized to the
    /// embedding provider's dimensionality.
    pub async fn ensure_index(&self) -> Result<()> {
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(&self.collection, dimensions).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "failed to create collection");
            e
        })
    }

    /// Drop the collection and create it again, empty.
    pub async fn recreate_index(&self) -> Result<()> {
        self.vector_store.delete_collection(&self.collection).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "failed to delete collection");
            e
        })?;
        info!(collection = %self.collection, "collection dropped");
        self.ensure_index().await
    }

    /// Chunk, embed and upsert `documents`.
    ///
    /// Chunks are embedded in fixed-size batches. Returns every stored chunk
    /// with its embedding attached.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the provider fails or returns
    /// vectors of the wrong count or size, and [`RagError::IndexUnavailable`]
    /// if the upsert fails.
    pub async fn ingest(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut chunks = self.chunker.chunk_all(documents);
        if chunks.is_empty() {
            info!(collection = %self.collection, chunk_count = 0, "nothing to ingest");
            return Ok(chunks);
        }

        let dimensions = self.embedding_provider.dimensions();
        for batch in chunks.chunks_mut(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(error = %e, "embedding failed during ingestion");
                e
            })?;

            if embeddings.len() != batch.len() {
                return Err(self.embedding_error(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }
            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                if embedding.len() != dimensions {
                    return Err(self.embedding_error(format!(
                        "embedding has {} dimensions, expected {dimensions}",
                        embedding.len()
                    )));
                }
                chunk.embedding = embedding;
            }

            self.vector_store.upsert(&self.collection, batch).await.map_err(|e| {
                error!(collection = %self.collection, error = %e, "upsert failed during ingestion");
                e
            })?;
        }

        info!(
            collection = %self.collection,
            documents = documents.len(),
            chunk_count = chunks.len(),
            "ingested documents"
        );
        Ok(chunks)
    }

    /// Retrieve the configured `top_k` chunks most similar to `question`.
    pub async fn query(&self, question: &str) -> Result<Vec<SearchResult>> {
        self.query_top_k(question, self.config.top_k).await
    }

    /// Retrieve at most `k` chunks most similar to `question`, best first.
    ///
    /// Results scoring below the configured `similarity_threshold` are dropped.
    /// An empty collection yields an empty `Vec`.
    pub async fn query_top_k(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;

        let results =
            self.vector_store.search(&self.collection, &query_embedding, k).await.map_err(|e| {
                error!(collection = %self.collection, error = %e, "vector store search failed");
                e
            })?;

        let threshold = self.config.similarity_threshold;
        let filtered: Vec<SearchResult> =
            results.into_iter().take(k).filter(|r| r.score >= threshold).collect();

        info!(result_count = filtered.len(), "query completed");
        Ok(filtered)
    }

    fn embedding_error(&self, message: String) -> RagError {
        let model = self.embedding_provider.model_id().to_string();
        error!(%model, %message, "embedding provider misbehaved");
        RagError::Embedding { model, message }
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// Embedding provider, vector store and chunker are required. The config
/// defaults to [`RagConfig::default()`] and the collection to
/// [`DEFAULT_COLLECTION`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    collection: Option<String>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the collection (index) name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing or the
    /// collection name is blank.
    pub fn build(self) -> Result<RagPipeline> {
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;
        let collection = self.collection.unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        if collection.trim().is_empty() {
            return Err(RagError::Config("collection name must not be empty".to_string()));
        }

        Ok(RagPipeline {
            config: self.config.unwrap_or_default(),
            embedding_provider,
            vector_store,
            chunker,
            collection,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::chunking::RecursiveChunker;
    use crate::error::ErrorKind;
    use crate::inmemory::InMemoryVectorStore;

    /// Maps text to a 4-dim vector keyed on a few words.
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let t = text.to_lowercase();
            Ok(["aspirin", "insulin", "fever", "glucose"]
                .iter()
                .map(|w| if t.contains(w) { 1.0 } else { 0.0 })
                .collect())
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn model_id(&self) -> &str {
            "keyword"
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl EmbeddingProvider for ShortEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn model_id(&self) -> &str {
            "short"
        }
    }

    fn pipeline(embedder: Arc<dyn EmbeddingProvider>, config: RagConfig) -> RagPipeline {
        RagPipeline::builder()
            .chunker(Arc::new(RecursiveChunker::from_config(&config)))
            .config(config)
            .embedding_provider(embedder)
            .vector_store(Arc::new(InMemoryVectorStore::new()))
            .collection("test")
            .build()
            .unwrap()
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("data/aspirin.pdf", "Aspirin reduces fever and inflammation.")
                .with_page(1),
            Document::new("data/diabetes.pdf", "Insulin lowers blood glucose.").with_page(1),
        ]
    }

    #[test]
    fn builder_requires_collaborators() {
        let err = RagPipeline::builder().build().err().unwrap();
        assert!(err.to_string().contains("embedding_provider is required"));
    }

    #[tokio::test]
    async fn ingest_then_query_returns_best_match_first() {
        let p = pipeline(Arc::new(KeywordEmbedder), RagConfig::default());
        p.ensure_index().await.unwrap();
        let stored = p.ingest(&corpus()).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|c| c.embedding.len() == 4));

        let results = p.query("What does aspirin do?").await.unwrap();
        assert_eq!(results[0].chunk.source, "data/aspirin.pdf");
        assert_eq!(results[0].chunk.page, Some(1));
    }

    #[tokio::test]
    async fn reingest_does_not_duplicate() {
        let p = pipeline(Arc::new(KeywordEmbedder), RagConfig::default());
        p.ensure_index().await.unwrap();
        p.ingest(&corpus()).await.unwrap();
        p.ingest(&corpus()).await.unwrap();
        assert_eq!(p.query_top_k("aspirin", 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn threshold_filters_weak_matches() {
        let config = RagConfig::builder().similarity_threshold(0.5).build().unwrap();
        let p = pipeline(Arc::new(KeywordEmbedder), config);
        p.ensure_index().await.unwrap();
        p.ingest(&corpus()).await.unwrap();
        let results = p.query_top_k("aspirin", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].score >= 0.5);
    }

    #[tokio::test]
    async fn query_without_index_is_index_unavailable() {
        let p = pipeline(Arc::new(KeywordEmbedder), RagConfig::default());
        let err = p.query("aspirin").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
    }

    #[tokio::test]
    async fn wrong_dimension_embeddings_are_rejected() {
        let p = pipeline(Arc::new(ShortEmbedder), RagConfig::default());
        p.ensure_index().await.unwrap();
        let err = p.ingest(&corpus()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
    }

    #[tokio::test]
    async fn recreate_empties_the_collection() {
        let p = pipeline(Arc::new(KeywordEmbedder), RagConfig::default());
        p.ensure_index().await.unwrap();
        p.ingest(&corpus()).await.unwrap();
        p.recreate_index().await.unwrap();
        assert!(p.query("aspirin").await.unwrap().is_empty());
    }
}
