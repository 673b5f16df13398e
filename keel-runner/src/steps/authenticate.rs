use async_trait::async_trait;
use keel_core::BuildId;
use keel_core::domain::step::StepKind;

use super::{Step, StepError};
use crate::config::DeployConfig;
use crate::context::RunContext;
use crate::process::CommandSpec;
use crate::tools::gcloud;

/// Scopes the following control-plane commands to the target cluster
pub struct AuthenticateStep;

fn command(config: &DeployConfig) -> CommandSpec {
    gcloud::get_credentials(
        &config.cluster_name,
        &config.cluster_location,
        &config.project_id,
    )
}

#[async_trait]
impl Step for AuthenticateStep {
    fn kind(&self) -> StepKind {
        StepKind::Authenticate
    }

    fn describe(&self, config: &DeployConfig, _build_id: &BuildId) -> Vec<String> {
        vec![command(config).display()]
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), StepError> {
        ctx.exec(&command(&ctx.config)).await?;
        Ok(())
    }
}
