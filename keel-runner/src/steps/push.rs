use async_trait::async_trait;
use keel_core::BuildId;
use keel_core::domain::step::StepKind;

use super::{Step, StepError};
use crate::config::DeployConfig;
use crate::context::RunContext;
use crate::tools::docker;

/// Pushes both images once everything else succeeded
pub struct PushImagesStep;

fn image_refs(config: &DeployConfig, build_id: &BuildId) -> [String; 2] {
    [
        config.image_ref(&config.app_image, build_id),
        config.image_ref(&config.admin_image, build_id),
    ]
}

#[async_trait]
impl Step for PushImagesStep {
    fn kind(&self) -> StepKind {
        StepKind::PushImages
    }

    fn describe(&self, config: &DeployConfig, build_id: &BuildId) -> Vec<String> {
        image_refs(config, build_id)
            .iter()
            .map(|image| docker::push(image).display())
            .collect()
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), StepError> {
        for image in image_refs(&ctx.config, &ctx.build_id) {
            ctx.exec(&docker::push(&image)).await?;
        }
        Ok(())
    }
}
