//! Build identifier resolution from git

use keel_core::{BuildId, BuildIdError};
use thiserror::Error;
use tracing::info;

use crate::process::{CommandRunner, CommandSpec, ProcessError, run_checked};

#[derive(Debug, Error)]
pub enum ResolveBuildIdError {
    #[error("failed to read the current commit: {0}")]
    Git(#[from] ProcessError),

    #[error(transparent)]
    Invalid(#[from] BuildIdError),
}

/// `git rev-parse --short HEAD`
pub fn short_head() -> CommandSpec {
    CommandSpec::new("git").args(["rev-parse", "--short", "HEAD"])
}

/// Uses the explicit build id if given, otherwise the current commit's short hash
pub async fn resolve_build_id(
    runner: &dyn CommandRunner,
    explicit: Option<&str>,
) -> Result<BuildId, ResolveBuildIdError> {
    if let Some(id) = explicit {
        return Ok(BuildId::parse(id)?);
    }

    let output = run_checked(runner, &short_head()).await?;
    let build_id = BuildId::parse(&output.stdout_lossy())?;
    info!("Resolved build id {} from git", build_id);
    Ok(build_id)
}
