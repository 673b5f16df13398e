//! Plan command handler

use anyhow::Result;
use colored::*;
use keel_runner::{DeployConfig, Sequencer, SystemRunner};

use super::BuildArgs;

/// Print every step with the commands it would run
///
/// Nothing is executed except `git rev-parse` when no build id is given.
pub async fn handle_plan(build: &BuildArgs, config: DeployConfig) -> Result<()> {
    let build_id = build.resolve(&SystemRunner::new()).await?;
    let sequencer = Sequencer::standard();

    println!(
        "{} {}",
        "Deployment plan for build".bold(),
        build_id.as_str().cyan()
    );
    println!();

    for (idx, (kind, lines)) in sequencer.plan(&config, &build_id).into_iter().enumerate() {
        println!("  {} {}", format!("{}.", idx + 1).dimmed(), kind.name().bold());
        for line in lines {
            println!("       {}", line);
        }
    }

    Ok(())
}
