//! Error types for the `medbot-rag` crate.

use thiserror::Error;

/// Errors that can occur while loading, indexing, retrieving, or answering.
///
/// Every fallible operation in this crate returns one of these variants.
/// The orchestrator never retries; callers at the request boundary decide how
/// to present the failure.
#[derive(Debug, Error)]
pub enum RagError {
    /// A source document could not be discovered, read, or parsed.
    #[error("Load error ({path}): {message}")]
    Load {
        /// The file or directory that failed.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding model could not be loaded or failed during inference.
    #[error("Embedding error ({model}): {message}")]
    Embedding {
        /// The embedding model identifier.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index is unreachable, missing, or rejected the request.
    #[error("Vector index unavailable ({backend}): {message}")]
    IndexUnavailable {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The completion model call failed, including authentication and rate limits.
    #[error("Synthesis error ({model}): {message}")]
    Synthesis {
        /// The completion model identifier.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// The taxonomy bucket of a [`RagError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Load,
    Embedding,
    IndexUnavailable,
    Synthesis,
    Config,
}

impl RagError {
    /// Return the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::Load { .. } => ErrorKind::Load,
            RagError::Embedding { .. } => ErrorKind::Embedding,
            RagError::IndexUnavailable { .. } => ErrorKind::IndexUnavailable,
            RagError::Synthesis { .. } => ErrorKind::Synthesis,
            RagError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn load(path: impl Into<String>, message: impl Into<String>) -> Self {
        RagError::Load { path: path.into(), message: message.into() }
    }

    pub(crate) fn index(backend: impl Into<String>, message: impl Into<String>) -> Self {
        RagError::IndexUnavailable { backend: backend.into(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
