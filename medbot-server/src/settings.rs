//! Runtime settings, from flags, environment variables or a `.env` file.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use medbot_rag::{PromptStyle, RagConfig, Result};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, one event per line.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "medbot")]
pub struct Settings {
    #[arg(long, env = "APP_NAME", default_value = "Medical ChatBot API")]
    pub app_name: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Vector index (collection) name.
    #[arg(long, env = "INDEX_NAME", default_value = "medical-chatbot")]
    pub index_name: String,

    /// Qdrant gRPC endpoint.
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6334")]
    pub qdrant_url: String,

    #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true)]
    pub qdrant_api_key: Option<String>,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = "sentence-transformers/all-MiniLM-L6-v2")]
    pub embedding_model: String,

    /// Where downloaded embedding model weights are cached.
    #[arg(long, env = "EMBEDDING_CACHE_DIR")]
    pub embedding_cache_dir: Option<PathBuf>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-flash")]
    pub gemini_model: String,

    /// Required to answer questions; ingestion works without it.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_BASE_URL")]
    pub gemini_base_url: Option<String>,

    /// Number of chunks retrieved per question.
    #[arg(long, env = "SEARCH_K", default_value_t = 3)]
    pub search_k: usize,

    #[arg(long, env = "CHUNK_SIZE", default_value_t = 500)]
    pub chunk_size: usize,

    #[arg(long, env = "CHUNK_OVERLAP", default_value_t = 20)]
    pub chunk_overlap: usize,

    #[arg(long, env = "SIMILARITY_THRESHOLD", default_value_t = 0.0)]
    pub similarity_threshold: f32,

    #[arg(long, env = "PROMPT_STYLE", default_value_t = PromptStyle::Concise)]
    pub prompt_style: PromptStyle,

    /// Append a medical-advice disclaimer to every answer.
    #[arg(
        long,
        env = "SAFETY_DISCLAIMER",
        default_value_t = false,
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub safety_disclaimer: bool,

    #[arg(long, env = "INDEX_TIMEOUT_SECS", default_value_t = 10)]
    pub index_timeout_secs: u64,

    #[arg(long, env = "COMPLETION_TIMEOUT_SECS", default_value_t = 60)]
    pub completion_timeout_secs: u64,

    /// Allowed browser origins, comma separated.
    #[arg(
        long,
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000,http://127.0.0.1:3000"
    )]
    pub cors_origins: Vec<String>,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Settings {
    /// Chunking and retrieval parameters, validated.
    pub fn rag_config(&self) -> Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.search_k)
            .similarity_threshold(self.similarity_threshold)
            .build()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
