//! Image build steps

use async_trait::async_trait;
use keel_core::BuildId;
use keel_core::domain::step::StepKind;

use super::{Step, StepError};
use crate::config::{DeployConfig, ImageConfig};
use crate::context::RunContext;
use crate::tools::docker;

/// Which of the two images a build step produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    App,
    Admin,
}

impl ImageTarget {
    pub fn image<'a>(&self, config: &'a DeployConfig) -> &'a ImageConfig {
        match self {
            ImageTarget::App => &config.app_image,
            ImageTarget::Admin => &config.admin_image,
        }
    }
}

/// Builds one image tagged with the run's build id
pub struct BuildImageStep {
    target: ImageTarget,
}

impl BuildImageStep {
    pub fn new(target: ImageTarget) -> Self {
        Self { target }
    }

    fn command(&self, config: &DeployConfig, build_id: &BuildId) -> crate::process::CommandSpec {
        let image = self.target.image(config);
        docker::build(
            &config.image_ref(image, build_id),
            &image.dockerfile,
            &image.context,
        )
    }
}

#[async_trait]
impl Step for BuildImageStep {
    fn kind(&self) -> StepKind {
        match self.target {
            ImageTarget::App => StepKind::BuildApp,
            ImageTarget::Admin => StepKind::BuildAdmin,
        }
    }

    fn describe(&self, config: &DeployConfig, build_id: &BuildId) -> Vec<String> {
        vec![self.command(config, build_id).display()]
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), StepError> {
        let command = self.command(&ctx.config, &ctx.build_id);
        ctx.exec(&command).await?;
        Ok(())
    }
}
