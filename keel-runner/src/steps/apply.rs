use async_trait::async_trait;
use keel_core::BuildId;
use keel_core::domain::step::StepKind;
use keel_core::manifest::join_documents;
use secrecy::Secret;

use super::{Step, StepError};
use crate::config::DeployConfig;
use crate::context::RunContext;
use crate::tools::kubectl;

/// Submits every rendered manifest to the cluster in one apply call
///
/// If the cluster rejects one document, the documents before it may
/// already be applied; there is no rollback.
pub struct ApplyStep;

#[async_trait]
impl Step for ApplyStep {
    fn kind(&self) -> StepKind {
        StepKind::Apply
    }

    fn depends_on(&self) -> &[StepKind] {
        &[StepKind::Render]
    }

    fn describe(&self, config: &DeployConfig, _build_id: &BuildId) -> Vec<String> {
        vec![format!(
            "kubectl apply -f - < rendered manifests from {}",
            config.manifest_dir.display()
        )]
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), StepError> {
        if ctx.rendered().is_empty() {
            return Err(StepError::MissingInput("rendered manifests"));
        }

        let stream = join_documents(ctx.rendered());
        ctx.log_info(format!("Applying {} manifest(s)", ctx.rendered().len()));
        ctx.exec(&kubectl::apply_stdin(Secret::new(stream))).await?;
        Ok(())
    }
}
