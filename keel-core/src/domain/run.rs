//! Pipeline run records
//!
//! A run record is created when the sequencer starts, updated as each
//! step finishes, and appended to the history log once the run ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::build_id::BuildId;
use super::log::LogEntry;
use super::step::{StepKind, StepStatus};

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Succeeded => write!(f, "Succeeded"),
            RunStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Outcome of one step within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub kind: StepKind,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl StepRecord {
    fn pending(kind: StepKind) -> Self {
        Self {
            kind,
            status: StepStatus::Pending,
            started_at: None,
            finished_at: None,
            error_message: None,
            logs: Vec::new(),
        }
    }
}

/// A single execution of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub build_id: BuildId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
}

impl PipelineRun {
    /// Starts a new run with every step pending
    pub fn start(build_id: BuildId, steps: impl IntoIterator<Item = StepKind>) -> Self {
        Self {
            id: Uuid::new_v4(),
            build_id,
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            steps: steps.into_iter().map(StepRecord::pending).collect(),
        }
    }

    /// Returns the record of the given step, if it is part of this run
    pub fn step(&self, kind: StepKind) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    /// Whether the given step finished successfully earlier in this run
    pub fn has_succeeded(&self, kind: StepKind) -> bool {
        self.step(kind)
            .is_some_and(|s| s.status == StepStatus::Succeeded)
    }

    /// The step that failed the run, if any
    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }

    /// Marks the step at `index` as running
    pub fn mark_running(&mut self, index: usize) {
        if let Some(step) = self.steps.get_mut(index) {
            step.status = StepStatus::Running;
            step.started_at = Some(Utc::now());
        }
    }

    /// Marks the step at `index` as finished with the given outcome
    pub fn mark_finished(
        &mut self,
        index: usize,
        outcome: Result<(), String>,
        logs: Vec<LogEntry>,
    ) {
        if let Some(step) = self.steps.get_mut(index) {
            step.finished_at = Some(Utc::now());
            step.logs = logs;
            match outcome {
                Ok(()) => step.status = StepStatus::Succeeded,
                Err(message) => {
                    step.status = StepStatus::Failed;
                    step.error_message = Some(message);
                }
            }
        }
    }

    /// Closes the run
    ///
    /// Steps that never started are marked skipped, and the run status is
    /// derived from the step outcomes.
    pub fn finish(&mut self) {
        for step in &mut self.steps {
            if !step.status.is_terminal() {
                step.status = StepStatus::Skipped;
            }
        }

        self.status = if self.failed_step().is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        };
        self.finished_at = Some(Utc::now());
    }
}
