//! `medbot-server` exposes the medical question-answering pipeline over HTTP
//! and provides the command that builds its vector index from PDFs.

pub mod cli;
pub mod error;
pub mod ingest;
pub mod protocol;
pub mod server;
pub mod service;
pub mod settings;
pub mod telemetry;

pub use server::{AppState, app_router, run_server};
pub use service::ServiceCell;
pub use settings::Settings;
