//! Deterministic doubles for end-to-end tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use medbot_rag::{
    AnswerSynthesizer, ChatService, CompletionModel, Document, EMBEDDING_DIMENSIONS,
    EmbeddingProvider, InMemoryVectorStore, RagConfig, RagError, RagPipeline, RecursiveChunker,
    Result,
};

const STOPWORDS: &[&str] =
    &["what", "does", "which", "with", "from", "that", "this", "about", "the"];

pub const DONT_KNOW: &str = "I don't know. The provided context does not contain that information.";

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

fn keywords(text: &str) -> Vec<String> {
    tokens(text).filter(|w| w.len() > 3 && !STOPWORDS.contains(&w.as_str())).collect()
}

/// Bag-of-words embedder: each token is hashed into one of 384 buckets.
pub struct HashingEmbedder;

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIMENSIONS];
        for token in tokens(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            v[(hasher.finish() % EMBEDDING_DIMENSIONS as u64) as usize] += 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }

    fn model_id(&self) -> &str {
        "hashing-bow"
    }
}

/// Answers with the first context sentence sharing a keyword with the
/// question, or admits it does not know.
pub struct GroundedModel;

#[async_trait]
impl CompletionModel for GroundedModel {
    fn name(&self) -> &str {
        "grounded-script"
    }

    async fn complete(&self, system_instruction: &str, user_content: &str) -> Result<String> {
        let context = system_instruction.split_once("\n\n").map(|(_, c)| c).unwrap_or_default();
        let wanted = keywords(user_content);
        let hit = context
            .split_inclusive('.')
            .map(str::trim)
            .find(|sentence| keywords(sentence).iter().any(|k| wanted.contains(k)));
        Ok(hit.map(str::to_string).unwrap_or_else(|| DONT_KNOW.to_string()))
    }
}

/// Fails every call like an unreachable completion service.
pub struct UnreachableModel;

#[async_trait]
impl CompletionModel for UnreachableModel {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn complete(&self, _system_instruction: &str, _user_content: &str) -> Result<String> {
        Err(RagError::Synthesis {
            model: "unreachable".into(),
            message: "request failed: connection refused".into(),
        })
    }
}

pub async fn service_over(documents: &[Document], model: Arc<dyn CompletionModel>) -> ChatService {
    let config = RagConfig::default();
    let pipeline = RagPipeline::builder()
        .chunker(Arc::new(RecursiveChunker::from_config(&config)))
        .config(config)
        .embedding_provider(Arc::new(HashingEmbedder))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .collection("medical-chatbot")
        .build()
        .unwrap();
    pipeline.ensure_index().await.unwrap();
    pipeline.ingest(documents).await.unwrap();
    ChatService::new(pipeline, AnswerSynthesizer::new(model))
}
