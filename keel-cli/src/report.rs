//! Terminal output for run records

use colored::*;
use keel_core::domain::log::{LogEntry, LogLevel};
use keel_core::domain::run::{PipelineRun, RunStatus, StepRecord};
use keel_core::domain::step::StepStatus;

/// Print a finished run, step by step
///
/// Logs are printed for the failed step, or for every step when `verbose`.
pub fn print_run(run: &PipelineRun, verbose: bool) {
    println!();
    println!("{}", "Run Summary:".bold());
    println!("  Run ID:   {}", run.id.to_string().cyan());
    println!("  Build:    {}", run.build_id.as_str().bold());
    println!("  Status:   {}", colorize_run_status(&run.status));
    println!(
        "  Started:  {}",
        run.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();

    for step in &run.steps {
        print_step(step);
        if verbose || step.status == StepStatus::Failed {
            for entry in &step.logs {
                print!("      ");
                print_log_entry(entry);
            }
        }
    }
}

/// Print a one-line summary of a run
pub fn print_run_summary(run: &PipelineRun) {
    let failed = run
        .failed_step()
        .map(|s| format!("failed at {}", s.kind))
        .unwrap_or_default();

    println!(
        "  {} {}  {}  {}  {}",
        "▸".cyan(),
        run.started_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed(),
        run.build_id.as_str().bold(),
        colorize_run_status(&run.status),
        failed.red()
    );
    println!("    ID: {}", run.id.to_string().dimmed());
}

fn print_step(step: &StepRecord) {
    let marker = match step.status {
        StepStatus::Succeeded => "✓".green(),
        StepStatus::Failed => "✗".red(),
        StepStatus::Skipped => "-".dimmed(),
        StepStatus::Pending | StepStatus::Running => "…".yellow(),
    };

    let duration = match (step.started_at, step.finished_at) {
        (Some(start), Some(end)) => {
            format!("{:.1}s", (end - start).num_milliseconds() as f64 / 1000.0)
        }
        _ => String::new(),
    };

    println!(
        "  {} {:<15} {:<10} {}",
        marker,
        step.kind.name(),
        colorize_step_status(&step.status),
        duration.dimmed()
    );

    if let Some(error) = &step.error_message {
        println!("      {}", error.red());
    }
}

fn print_log_entry(log: &LogEntry) {
    let level_str = log.level.to_string();
    let level_colored = match log.level {
        LogLevel::Debug => level_str.dimmed(),
        LogLevel::Info => level_str.cyan(),
        LogLevel::Warning => level_str.yellow(),
        LogLevel::Error => level_str.red(),
    };

    println!(
        "{} [{}] {}",
        log.timestamp.format("%H:%M:%S").to_string().dimmed(),
        level_colored,
        log.message
    );
}

fn colorize_run_status(status: &RunStatus) -> ColoredString {
    match status {
        RunStatus::Running => status.to_string().yellow(),
        RunStatus::Succeeded => status.to_string().green(),
        RunStatus::Failed => status.to_string().red(),
    }
}

fn colorize_step_status(status: &StepStatus) -> ColoredString {
    match status {
        StepStatus::Succeeded => status.to_string().green(),
        StepStatus::Failed => status.to_string().red(),
        StepStatus::Skipped => status.to_string().dimmed(),
        StepStatus::Pending | StepStatus::Running => status.to_string().yellow(),
    }
}
