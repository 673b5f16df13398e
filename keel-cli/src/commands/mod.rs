//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod deploy;
mod history;
mod plan;
mod render;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use keel_core::BuildId;
use keel_runner::tools::git::resolve_build_id;
use keel_runner::{CommandRunner, DeployConfig};
use std::path::PathBuf;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the full deployment pipeline
    Deploy {
        #[command(flatten)]
        build: BuildArgs,

        /// Print the logs of every step, not only the failed one
        #[arg(short, long)]
        verbose: bool,
    },
    /// Render and validate the manifests without touching the cluster
    Render {
        #[command(flatten)]
        build: BuildArgs,

        /// Write rendered manifests to this directory instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show every step and the command it would run
    Plan {
        #[command(flatten)]
        build: BuildArgs,
    },
    /// List recorded pipeline runs
    History {
        /// Maximum number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

/// Build identifier selection
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Build identifier (defaults to the short hash of HEAD)
    #[arg(long, env = "KEEL_BUILD_ID")]
    pub build_id: Option<String>,
}

impl BuildArgs {
    /// Resolves the build id, falling back to git
    pub async fn resolve(&self, runner: &dyn CommandRunner) -> Result<BuildId> {
        resolve_build_id(runner, self.build_id.as_deref())
            .await
            .context("Failed to determine the build id (use --build-id to set it)")
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The deployment configuration
pub async fn handle_command(command: Commands, config: DeployConfig) -> Result<()> {
    match command {
        Commands::Deploy { build, verbose } => {
            deploy::handle_deploy(&build, verbose, validated(config)?).await
        }
        Commands::Render { build, output } => {
            render::handle_render(&build, output, validated(config)?).await
        }
        Commands::Plan { build } => plan::handle_plan(&build, validated(config)?).await,
        Commands::History { limit } => history::handle_history(limit, &config),
    }
}

fn validated(config: DeployConfig) -> Result<DeployConfig> {
    config
        .validate()
        .context("Invalid deployment configuration")?;
    Ok(config)
}
