//! Step domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The steps of the deployment pipeline, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    /// Build the application image
    BuildApp,
    /// Build the admin UI image
    BuildAdmin,
    /// Obtain credentials for the target cluster
    Authenticate,
    /// Substitute placeholder tokens in the manifests
    Render,
    /// Retrieve the database password from the secret store
    FetchSecret,
    /// Publish the database password as a cluster secret object
    PublishSecret,
    /// Submit the rendered manifests to the cluster
    Apply,
    /// Push the built images to the registry
    PushImages,
}

impl StepKind {
    /// All steps in the order the standard pipeline runs them
    pub const ALL: [StepKind; 8] = [
        StepKind::BuildApp,
        StepKind::BuildAdmin,
        StepKind::Authenticate,
        StepKind::Render,
        StepKind::FetchSecret,
        StepKind::PublishSecret,
        StepKind::Apply,
        StepKind::PushImages,
    ];

    /// Human-readable step name
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::BuildApp => "Build-App",
            StepKind::BuildAdmin => "Build-Admin",
            StepKind::Authenticate => "Authenticate",
            StepKind::Render => "Render",
            StepKind::FetchSecret => "Fetch-Secret",
            StepKind::PublishSecret => "Publish-Secret",
            StepKind::Apply => "Apply",
            StepKind::PushImages => "Push-Images",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Status of a single step within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Not started yet
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Never started because an earlier step failed
    Skipped,
}

impl StepStatus {
    /// Whether the step reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Succeeded | StepStatus::Failed | StepStatus::Skipped
        )
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "Pending"),
            StepStatus::Running => write!(f, "Running"),
            StepStatus::Succeeded => write!(f, "Succeeded"),
            StepStatus::Failed => write!(f, "Failed"),
            StepStatus::Skipped => write!(f, "Skipped"),
        }
    }
}
