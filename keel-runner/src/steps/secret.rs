//! Secret fetch and publish steps
//!
//! The fetch step reads the database password from the secret store into
//! the run context; the publish step consumes it exactly once to reconcile
//! the cluster secret object. The value never touches disk or the logs.

use async_trait::async_trait;
use keel_core::BuildId;
use keel_core::domain::secret::{ClusterSecret, SecretMaterial};
use keel_core::domain::step::StepKind;

use super::{Step, StepError};
use crate::config::DeployConfig;
use crate::context::RunContext;
use crate::tools::{gcloud, kubectl};

/// Retrieves the latest version of the database password
pub struct FetchSecretStep;

#[async_trait]
impl Step for FetchSecretStep {
    fn kind(&self) -> StepKind {
        StepKind::FetchSecret
    }

    fn describe(&self, config: &DeployConfig, _build_id: &BuildId) -> Vec<String> {
        vec![gcloud::access_secret(&config.secret_name, &config.project_id).display()]
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), StepError> {
        let command = gcloud::access_secret(&ctx.config.secret_name, &ctx.config.project_id);
        let output = ctx.exec(&command).await?;

        let material = SecretMaterial::from_bytes(ctx.config.secret_name.clone(), output.stdout)?;
        ctx.log_info(format!("Fetched secret '{}'", material.name()));
        ctx.set_secret(material);
        Ok(())
    }
}

/// Publishes the fetched password as the cluster secret object
pub struct PublishSecretStep;

#[async_trait]
impl Step for PublishSecretStep {
    fn kind(&self) -> StepKind {
        StepKind::PublishSecret
    }

    fn depends_on(&self) -> &[StepKind] {
        &[StepKind::FetchSecret]
    }

    fn describe(&self, config: &DeployConfig, _build_id: &BuildId) -> Vec<String> {
        vec![format!(
            "kubectl apply -f - < secret/{} ({}=<fetched secret>)",
            config.cluster_secret_name, config.cluster_secret_key
        )]
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), StepError> {
        let material = ctx
            .take_secret()
            .ok_or(StepError::MissingInput("fetched secret"))?;

        let secret = ClusterSecret::from_material(
            ctx.config.cluster_secret_name.clone(),
            ctx.config.cluster_secret_key.clone(),
            material,
        );

        ctx.exec(&kubectl::apply_stdin(secret.to_document()?)).await?;
        ctx.log_info(format!(
            "Published secret '{}' with key '{}'",
            secret.name, secret.key
        ));
        Ok(())
    }
}
