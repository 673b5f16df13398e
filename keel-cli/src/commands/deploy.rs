//! Deploy command handler

use anyhow::Result;
use colored::*;
use keel_core::domain::run::RunStatus;
use keel_runner::{
    CommandRunner, DeployConfig, JsonlHistory, RunContext, RunHistory, Sequencer, SystemRunner,
};
use std::sync::Arc;
use tracing::warn;

use super::BuildArgs;
use crate::report::print_run;

/// Run the full pipeline and record the outcome
///
/// The run is recorded in the history even when it fails. A failed run
/// makes the command exit with an error naming the failed step.
pub async fn handle_deploy(build: &BuildArgs, verbose: bool, config: DeployConfig) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());
    let build_id = build.resolve(runner.as_ref()).await?;

    println!(
        "{} {} to {}",
        "Deploying build".bold(),
        build_id.as_str().cyan(),
        format!("{}/{}", config.project_id, config.cluster_name).cyan()
    );

    let history = JsonlHistory::new(config.history_path.clone());
    let mut ctx = RunContext::new(Arc::new(config), build_id, runner);

    let run = Sequencer::standard().run(&mut ctx).await;

    if let Err(e) = history.record(&run) {
        warn!("Failed to record run in history: {:#}", e);
    }

    print_run(&run, verbose);

    match run.status {
        RunStatus::Succeeded => {
            println!();
            println!("{}", "✓ Deployment completed successfully!".green().bold());
            Ok(())
        }
        _ => {
            let step = run
                .failed_step()
                .map(|s| s.kind.to_string())
                .unwrap_or_else(|| "unknown step".to_string());
            anyhow::bail!("Deployment failed at step {}", step)
        }
    }
}
