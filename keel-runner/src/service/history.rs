//! Run history
//!
//! Every finished run, successful or not, is appended to a JSON Lines file
//! so failures stay visible after the process exits. Step logs are kept;
//! secret values never reach a run record in the first place.

use anyhow::{Context, Result};
use keel_core::domain::run::PipelineRun;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage for finished pipeline runs
pub trait RunHistory: Send + Sync {
    /// Records a finished run
    fn record(&self, run: &PipelineRun) -> Result<()>;

    /// Returns up to `limit` runs, most recent first
    fn recent(&self, limit: usize) -> Result<Vec<PipelineRun>>;
}

/// History stored as one JSON document per line
#[derive(Debug, Clone)]
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunHistory for JsonlHistory {
    fn record(&self, run: &PipelineRun) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create history directory {:?}", parent))?;
        }

        let line = serde_json::to_string(run).context("Failed to serialize run record")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file {:?}", self.path))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write history file {:?}", self.path))?;

        debug!("Recorded run {} in {:?}", run.id, self.path);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<PipelineRun>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history file {:?}", self.path))?;

        let mut runs = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<PipelineRun>(line).with_context(|| {
                    format!("Invalid run record at {:?} line {}", self.path, idx + 1)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        runs.reverse();
        runs.truncate(limit);
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::BuildId;
    use keel_core::domain::run::RunStatus;
    use keel_core::domain::step::StepKind;

    fn history_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("keel-history-{}", uuid::Uuid::new_v4()))
            .join("history.jsonl")
    }

    fn finished_run(build_id: &str, fail: bool) -> PipelineRun {
        let mut run = PipelineRun::start(BuildId::parse(build_id).unwrap(), StepKind::ALL);
        run.mark_running(0);
        let outcome = if fail {
            Err("docker build exited with code 1".to_string())
        } else {
            Ok(())
        };
        run.mark_finished(0, outcome, vec![]);
        run.finish();
        run
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let history = JsonlHistory::new(history_path());
        assert!(history.recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_record_and_read_back_newest_first() {
        let path = history_path();
        let history = JsonlHistory::new(path.clone());

        history.record(&finished_run("first", true)).unwrap();
        history.record(&finished_run("second", false)).unwrap();
        history.record(&finished_run("third", false)).unwrap();

        let runs = history.recent(2).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].build_id.as_str(), "third");
        assert_eq!(runs[1].build_id.as_str(), "second");

        let all = history.recent(10).unwrap();
        assert_eq!(all[2].status, RunStatus::Failed);
        assert_eq!(
            all[2].failed_step().map(|s| s.kind),
            Some(StepKind::BuildApp)
        );

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let path = history_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json\n").unwrap();

        let err = JsonlHistory::new(path.clone()).recent(5).unwrap_err();
        assert!(err.to_string().contains("line 1"));

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
