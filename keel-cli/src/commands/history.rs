//! History command handler

use anyhow::Result;
use colored::*;
use keel_runner::{DeployConfig, JsonlHistory, RunHistory};

use crate::report::print_run_summary;

/// List the most recent runs
pub fn handle_history(limit: usize, config: &DeployConfig) -> Result<()> {
    let history = JsonlHistory::new(config.history_path.clone());
    let runs = history.recent(limit)?;

    if runs.is_empty() {
        println!("{}", "No runs recorded.".yellow());
    } else {
        println!("{}", format!("Last {} run(s):", runs.len()).bold());
        println!();
        for run in &runs {
            print_run_summary(run);
        }
    }

    Ok(())
}
