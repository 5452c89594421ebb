//! # medbot-rag
//!
//! Retrieval-augmented question answering over a corpus of medical PDFs.
//!
//! The crate is organised as a pipeline of small components behind traits:
//!
//! - [`loader`] extracts per-page [`Document`]s from a directory of PDFs.
//! - [`Chunker`] splits documents into overlapping [`Chunk`]s.
//! - [`EmbeddingProvider`] maps text to 384-dimensional vectors.
//! - [`VectorStore`] stores chunk vectors and answers cosine top-k queries.
//! - [`AnswerSynthesizer`] prompts a [`CompletionModel`] with the retrieved context.
//! - [`ChatService`] ties retrieval and synthesis together per question.
//!
//! ## Feature flags
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `fastembed` | [`onnx::FastEmbedProvider`], local sentence-transformer embeddings |
//! | `qdrant` | [`qdrant::QdrantVectorStore`] |
//! | `gemini` | [`gemini::GeminiCompletionModel`] |
//! | `full` | all of the above |
//!
//! ## Example
//!
//! ```rust,ignore
//! let config = RagConfig::default();
//! let pipeline = RagPipeline::builder()
//!     .chunker(Arc::new(RecursiveChunker::from_config(&config)))
//!     .config(config)
//!     .embedding_provider(Arc::new(FastEmbedProvider::load(DEFAULT_MODEL_ID, None).await?))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//! let model = GeminiCompletionModel::new(key, "gemini-2.5-flash")?;
//! let synthesizer = AnswerSynthesizer::new(Arc::new(model));
//! let service = ChatService::new(pipeline, synthesizer);
//!
//! let exchange = service.process("What does aspirin do?").await?;
//! println!("{} (sources: {:?})", exchange.answer, exchange.context_used);
//! ```

pub mod chat;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod synthesis;
pub mod vectorstore;

#[cfg(feature = "fastembed")]
pub mod onnx;

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chat::{ChatService, HEALTH_PROBE};
pub use chunking::{Chunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{ChatExchange, Chunk, Document, SearchResult, chunk_id};
pub use embedding::{EMBEDDING_DIMENSIONS, EmbeddingProvider};
pub use error::{ErrorKind, RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use loader::{LoadFailure, LoadReport, load_pdf_directory};
pub use pipeline::{DEFAULT_COLLECTION, RagPipeline, RagPipelineBuilder};
pub use synthesis::{AnswerSynthesizer, CompletionModel, PromptStyle, SAFETY_DISCLAIMER};
pub use vectorstore::VectorStore;
