use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "medbot", about = "Medical question answering over a PDF knowledge base", version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the chat API over HTTP.
    Serve,
    /// Build or refresh the vector index from a directory of PDFs.
    Ingest {
        /// Directory searched recursively for `.pdf` files.
        #[arg(long, default_value = "data")]
        data: PathBuf,
        /// Drop the existing index before ingesting.
        #[arg(long)]
        recreate: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ingest_with_global_settings() {
        let cli = Cli::try_parse_from([
            "medbot",
            "--index-name",
            "test-index",
            "ingest",
            "--data",
            "corpus",
            "--recreate",
        ])
        .unwrap();
        assert_eq!(cli.settings.index_name, "test-index");
        match cli.command {
            Command::Ingest { data, recreate } => {
                assert_eq!(data, PathBuf::from("corpus"));
                assert!(recreate);
            }
            Command::Serve => panic!("expected ingest"),
        }
    }

    #[test]
    fn verifies_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
