//! Local sentence-transformer embeddings via `fastembed` (ONNX Runtime).
//!
//! This module is only available when the `fastembed` feature is enabled.
//! Model weights are downloaded on first load and cached on disk; inference
//! runs on tokio's blocking pool so it never stalls request handling.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, error, info};

use crate::embedding::{EMBEDDING_DIMENSIONS, EmbeddingProvider};
use crate::error::{RagError, Result};

/// The default model identifier, matching the one the index was built with.
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Map a model identifier to a `fastembed` model and its output dimensionality.
///
/// Only 384-dimensional models are accepted so vectors stay compatible with
/// the index.
pub fn resolve_model(model_id: &str) -> Option<(EmbeddingModel, usize)> {
    match model_id {
        "sentence-transformers/all-MiniLM-L6-v2" | "Qdrant/all-MiniLM-L6-v2-onnx" => {
            Some((EmbeddingModel::AllMiniLML6V2, EMBEDDING_DIMENSIONS))
        }
        "Xenova/all-MiniLM-L6-v2" => Some((EmbeddingModel::AllMiniLML6V2Q, EMBEDDING_DIMENSIONS)),
        "BAAI/bge-small-en-v1.5" => Some((EmbeddingModel::BGESmallENV15, EMBEDDING_DIMENSIONS)),
        _ => None,
    }
}

/// An [`EmbeddingProvider`] backed by a local `fastembed` model.
///
/// The loaded model is immutable and shared behind an `Arc`, so concurrent
/// requests embed without any locking.
///
/// # Example
///
/// ```rust,ignore
/// use medbot_rag::onnx::FastEmbedProvider;
///
/// let provider = FastEmbedProvider::load(DEFAULT_MODEL_ID, None).await?;
/// let embedding = provider.embed("What does aspirin do?").await?;
/// assert_eq!(embedding.len(), 384);
/// ```
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_id: String,
    dimensions: usize,
}

impl FastEmbedProvider {
    /// Load the model identified by `model_id`, downloading weights into
    /// `cache_dir` (or fastembed's default cache) if they are not present.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the identifier is unknown or the
    /// weights cannot be fetched or loaded.
    pub async fn load(model_id: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
        let (model_name, dimensions) = resolve_model(model_id).ok_or_else(|| {
            RagError::Embedding {
                model: model_id.to_string(),
                message: "unsupported embedding model identifier".into(),
            }
        })?;

        info!(model = model_id, "loading embedding model");
        let loaded = tokio::task::spawn_blocking(move || {
            let mut options = InitOptions::default();
            options.model_name = model_name;
            options.show_download_progress = false;
            if let Some(dir) = cache_dir {
                options.cache_dir = dir;
            }
            TextEmbedding::try_new(options)
        })
        .await
        .map_err(|e| RagError::Embedding {
            model: model_id.to_string(),
            message: format!("model loading task failed: {e}"),
        })?
        .map_err(|e| {
            error!(model = model_id, error = %e, "failed to load embedding model");
            RagError::Embedding { model: model_id.to_string(), message: e.to_string() }
        })?;

        info!(model = model_id, dimensions, "embedding model loaded");
        Ok(Self { model: Arc::new(loaded), model_id: model_id.to_string(), dimensions })
    }

    fn err(&self, message: impl Into<String>) -> RagError {
        RagError::Embedding { model: self.model_id.clone(), message: message.into() }
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| self.err("model returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.model_id, batch_size = texts.len(), "embedding batch");

        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let embeddings = tokio::task::spawn_blocking(move || model.embed(owned, None))
            .await
            .map_err(|e| self.err(format!("embedding task failed: {e}")))?
            .map_err(|e| {
                error!(model = %self.model_id, error = %e, "embedding inference failed");
                self.err(e.to_string())
            })?;

        if embeddings.len() != texts.len() {
            return Err(self.err(format!(
                "expected {} embeddings, model returned {}",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
