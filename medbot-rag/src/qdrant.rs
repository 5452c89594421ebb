//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use medbot_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334", None, Duration::from_secs(10))?;
//! store.create_collection("medical-chatbot", 384).await?;
//! store.upsert("medical-chatbot", &chunks).await?;
//! let results = store.search("medical-chatbot", &query_embedding, 3).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Collections use cosine distance. Chunk text, source, page and offset are
/// stored as point payload; the chunk id (a UUID) is the point id.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to the Qdrant gRPC endpoint at `url`.
    ///
    /// `timeout` bounds every request made through this store.
    pub fn new(url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client =
            Qdrant::from_url(url).api_key(api_key).timeout(timeout).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::index("qdrant", e.to_string())
    }

    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn extract_integer(value: &QdrantValue) -> Option<i64> {
        match &value.kind {
            Some(Kind::IntegerValue(n)) => Some(*n),
            _ => None,
        }
    }

    fn to_point(chunk: &Chunk) -> Result<PointStruct> {
        let mut payload = json!({
            "text": chunk.text,
            "source": chunk.source,
            "offset": chunk.offset,
        });
        if let Some(page) = chunk.page {
            payload["page"] = json!(page);
        }
        let payload = Payload::try_from(payload).map_err(Self::map_err)?;
        Ok(PointStruct::new(chunk.id.clone(), chunk.embedding.clone(), payload))
    }

    fn from_scored(scored: ScoredPoint) -> SearchResult {
        let id = scored
            .id
            .as_ref()
            .and_then(|pid| match &pid.point_id_options {
                Some(PointIdOptions::Uuid(s)) => Some(s.clone()),
                Some(PointIdOptions::Num(n)) => Some(n.to_string()),
                None => None,
            })
            .unwrap_or_default();

        let payload = &scored.payload;
        let text = payload.get("text").and_then(Self::extract_string).unwrap_or_default();
        let source = payload.get("source").and_then(Self::extract_string).unwrap_or_default();
        let offset = payload
            .get("offset")
            .and_then(Self::extract_integer)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        let page = payload
            .get("page")
            .and_then(Self::extract_integer)
            .and_then(|n| u32::try_from(n).ok());

        SearchResult {
            chunk: Chunk { id, text, source, page, offset, embedding: Vec::new() },
            score: scored.score,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        if self.client.collection_exists(name).await.map_err(Self::map_err)? {
            debug!(collection = name, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        if !self.client.collection_exists(name).await.map_err(Self::map_err)? {
            return Ok(());
        }
        self.client.delete_collection(name).await.map_err(Self::map_err)?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points = chunks.iter().map(Self::to_point).collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = chunks.len(), "upserted chunks to qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let mut results: Vec<SearchResult> =
            response.result.into_iter().map(Self::from_scored).collect();
        results.truncate(top_k);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Document;

    fn string_value(s: &str) -> QdrantValue {
        QdrantValue { kind: Some(Kind::StringValue(s.to_string())) }
    }

    fn int_value(n: i64) -> QdrantValue {
        QdrantValue { kind: Some(Kind::IntegerValue(n)) }
    }

    #[test]
    fn point_carries_payload_and_uuid_id() {
        let doc = Document::new("data/a.pdf", "Aspirin reduces fever.").with_page(2);
        let mut chunk = Chunk::new(&doc, 0, "Aspirin reduces fever.");
        chunk.embedding = vec![0.5; 4];
        let point = QdrantVectorStore::to_point(&chunk).unwrap();
        let source = point.payload.get("source").and_then(QdrantVectorStore::extract_string);
        assert_eq!(source.as_deref(), Some("data/a.pdf"));
        assert_eq!(point.payload.get("page").and_then(QdrantVectorStore::extract_integer), Some(2));
        assert!(matches!(
            point.id.and_then(|id| id.point_id_options),
            Some(PointIdOptions::Uuid(ref s)) if *s == chunk.id
        ));
    }

    #[test]
    fn scored_point_maps_back_to_chunk() {
        let payload = HashMap::from([
            ("text".to_string(), string_value("Aspirin reduces fever.")),
            ("source".to_string(), string_value("data/a.pdf")),
            ("offset".to_string(), int_value(12)),
        ]);
        let scored = ScoredPoint {
            id: Some("4a5b1c3e-0000-5000-8000-000000000000".to_string().into()),
            payload,
            score: 0.87,
            ..Default::default()
        };
        let result = QdrantVectorStore::from_scored(scored);
        assert_eq!(result.chunk.text, "Aspirin reduces fever.");
        assert_eq!(result.chunk.source, "data/a.pdf");
        assert_eq!(result.chunk.offset, 12);
        assert_eq!(result.chunk.page, None);
        assert!((result.score - 0.87).abs() < f32::EPSILON);
    }
}
