//! Keel CLI
//!
//! Command-line interface for running the deployment pipeline.

mod commands;
mod config;
mod report;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::ConfigArgs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "keel")]
#[command(about = "Keel deployment pipeline CLI", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keel_cli=info,keel_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config.into_config();

    handle_command(cli.command, config).await
}
