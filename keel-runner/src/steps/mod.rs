//! Pipeline steps
//!
//! Each step is a self-contained unit that performs one blocking external
//! invocation (or, for rendering, a pure transform) against the shared
//! [`RunContext`]. Steps pass data to each other only through typed fields
//! of the context.

mod apply;
mod authenticate;
mod build;
mod push;
mod render;
mod secret;

pub use apply::ApplyStep;
pub use authenticate::AuthenticateStep;
pub use build::{BuildImageStep, ImageTarget};
pub use push::PushImagesStep;
pub use render::{RenderStep, load_manifests, render_manifests};
pub use secret::{FetchSecretStep, PublishSecretStep};

use async_trait::async_trait;
use keel_core::domain::step::StepKind;
use keel_core::{BuildId, RenderError, SecretError};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::DeployConfig;
use crate::context::RunContext;
use crate::process::ProcessError;

/// Errors that fail a step
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error("failed to read manifests from {path}: {source}")]
    Manifests {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no manifests (*.yaml, *.yml) found in {0}")]
    NoManifests(PathBuf),

    #[error("step {dependency} has not completed successfully in this run")]
    UnmetDependency { dependency: StepKind },

    #[error("{0} is not available in the run context")]
    MissingInput(&'static str),
}

/// A single step of the deployment pipeline
#[async_trait]
pub trait Step: Send + Sync {
    fn kind(&self) -> StepKind;

    /// Steps that must have succeeded earlier in the same run
    fn depends_on(&self) -> &[StepKind] {
        &[]
    }

    /// What the step would do, one line per action, without running it
    fn describe(&self, config: &DeployConfig, build_id: &BuildId) -> Vec<String>;

    async fn run(&self, ctx: &mut RunContext) -> Result<(), StepError>;
}

/// The standard deployment pipeline, in execution order
pub fn standard_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(BuildImageStep::new(ImageTarget::App)),
        Box::new(BuildImageStep::new(ImageTarget::Admin)),
        Box::new(AuthenticateStep),
        Box::new(RenderStep),
        Box::new(FetchSecretStep),
        Box::new(PublishSecretStep),
        Box::new(ApplyStep),
        Box::new(PushImagesStep),
    ]
}
