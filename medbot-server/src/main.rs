use anyhow::Context;
use clap::Parser;
use medbot_server::{
    cli::{Cli, Command},
    ingest::run_ingest,
    run_server, telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal in production.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    telemetry::init_logging(cli.settings.log_format);

    match cli.command {
        Command::Serve => run_server(cli.settings).await.context("server exited with an error"),
        Command::Ingest { data, recreate } => run_ingest(&cli.settings, &data, recreate).await,
    }
}
