//! Construction of the shared [`ChatService`].

use std::sync::Arc;
use std::time::Duration;

use medbot_rag::gemini::GeminiCompletionModel;
use medbot_rag::onnx::FastEmbedProvider;
use medbot_rag::qdrant::QdrantVectorStore;
use medbot_rag::{AnswerSynthesizer, ChatService, RagError, RagPipeline, RecursiveChunker, Result};
use tokio::sync::OnceCell;
use tracing::info;

use crate::settings::Settings;

/// Build the retrieval pipeline: local embedding model, Qdrant index.
pub async fn build_pipeline(settings: &Settings) -> Result<RagPipeline> {
    let config = settings.rag_config()?;
    let embedder =
        FastEmbedProvider::load(&settings.embedding_model, settings.embedding_cache_dir.clone())
            .await?;
    let store = QdrantVectorStore::new(
        &settings.qdrant_url,
        settings.qdrant_api_key.clone(),
        Duration::from_secs(settings.index_timeout_secs),
    )?;

    RagPipeline::builder()
        .chunker(Arc::new(RecursiveChunker::from_config(&config)))
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .vector_store(Arc::new(store))
        .collection(settings.index_name.clone())
        .build()
}

/// Build the Gemini-backed synthesizer.
pub fn build_synthesizer(settings: &Settings) -> Result<AnswerSynthesizer> {
    let api_key = settings
        .gemini_api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| RagError::Config("GEMINI_API_KEY is not set".to_string()))?;

    let mut model = GeminiCompletionModel::new(api_key, settings.gemini_model.clone())?
        .with_timeout(Duration::from_secs(settings.completion_timeout_secs))?;
    if let Some(base_url) = &settings.gemini_base_url {
        model = model.with_base_url(base_url.clone());
    }

    Ok(AnswerSynthesizer::new(Arc::new(model))
        .with_style(settings.prompt_style)
        .with_safety_disclaimer(settings.safety_disclaimer))
}

pub async fn build_chat_service(settings: &Settings) -> Result<ChatService> {
    // Fail on a missing key before paying for the model download.
    let synthesizer = build_synthesizer(settings)?;
    let pipeline = build_pipeline(settings).await?;
    info!(
        index = %settings.index_name,
        embedding_model = %settings.embedding_model,
        completion_model = synthesizer.model_name(),
        "chat service ready"
    );
    Ok(ChatService::new(pipeline, synthesizer))
}

/// A [`ChatService`] built at most once and shared by every request.
///
/// Concurrent first callers wait on the same construction. A failed
/// construction is not cached, so the next request tries again.
#[derive(Clone)]
pub struct ServiceCell {
    cell: Arc<OnceCell<Arc<ChatService>>>,
    settings: Option<Arc<Settings>>,
}

impl ServiceCell {
    /// Build from `settings` on first use.
    pub fn lazy(settings: Settings) -> Self {
        Self { cell: Arc::new(OnceCell::new()), settings: Some(Arc::new(settings)) }
    }

    /// Wrap an already constructed service.
    pub fn ready(service: Arc<ChatService>) -> Self {
        Self { cell: Arc::new(OnceCell::new_with(Some(service))), settings: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> Result<Arc<ChatService>> {
        let service = self
            .cell
            .get_or_try_init(|| async {
                let settings = self
                    .settings
                    .as_deref()
                    .ok_or_else(|| RagError::Config("chat service is not configured".to_string()))?;
                info!("initialising chat service");
                build_chat_service(settings).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(service))
    }
}
