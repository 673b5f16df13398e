//! Pipeline sequencer
//!
//! Runs the steps one after another in declaration order:
//! - Each step runs to completion before the next one starts
//! - A step whose dependencies did not succeed earlier in the run fails
//! - The first failing step halts the run; later steps are skipped
//!
//! There are no retries and no rollback. A failure after the apply step
//! leaves the cluster updated while images may be missing from the registry.

use keel_core::BuildId;
use keel_core::domain::run::PipelineRun;
use keel_core::domain::step::StepKind;
use tracing::{error, info};

use crate::config::DeployConfig;
use crate::context::RunContext;
use crate::steps::{Step, StepError, standard_steps};

/// Executes a fixed list of steps against a run context
pub struct Sequencer {
    steps: Vec<Box<dyn Step>>,
}

impl Sequencer {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    /// The standard deployment pipeline
    pub fn standard() -> Self {
        Self::new(standard_steps())
    }

    /// Describes every step without running anything
    pub fn plan(
        &self,
        config: &DeployConfig,
        build_id: &BuildId,
    ) -> Vec<(StepKind, Vec<String>)> {
        self.steps
            .iter()
            .map(|step| (step.kind(), step.describe(config, build_id)))
            .collect()
    }

    /// Runs the steps in order, halting on the first failure
    ///
    /// Always returns a finished run record; inspect its status for the
    /// outcome.
    pub async fn run(&self, ctx: &mut RunContext) -> PipelineRun {
        let mut run = PipelineRun::start(
            ctx.build_id.clone(),
            self.steps.iter().map(|step| step.kind()),
        );

        info!("Starting run {} for build {}", run.id, run.build_id);
        let total = self.steps.len();

        for (idx, step) in self.steps.iter().enumerate() {
            let kind = step.kind();
            info!("Executing step {}/{}: {}", idx + 1, total, kind);

            // Anything logged outside a step does not belong to this one
            ctx.drain_logs();
            run.mark_running(idx);
            ctx.log_info(format!("Starting step: {}", kind));

            let outcome = match unmet_dependency(&run, step.as_ref()) {
                Some(dependency) => Err(StepError::UnmetDependency { dependency }),
                None => step.run(ctx).await,
            };

            match outcome {
                Ok(()) => {
                    ctx.log_info(format!("Step '{}' completed", kind));
                    run.mark_finished(idx, Ok(()), ctx.drain_logs());
                }
                Err(e) => {
                    error!("Step '{}' failed: {}", kind, e);
                    ctx.log_error(format!("Step '{}' failed: {}", kind, e));
                    run.mark_finished(idx, Err(e.to_string()), ctx.drain_logs());
                    break;
                }
            }
        }

        run.finish();
        info!("Run {} finished: {}", run.id, run.status);
        run
    }
}

fn unmet_dependency(run: &PipelineRun, step: &dyn Step) -> Option<StepKind> {
    step.depends_on()
        .iter()
        .copied()
        .find(|dependency| !run.has_succeeded(*dependency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandRunner;
    use crate::steps::PublishSecretStep;
    use crate::testing::ScriptedRunner;
    use keel_core::domain::run::RunStatus;
    use keel_core::domain::step::StepStatus;
    use std::path::PathBuf;
    use std::sync::Arc;

    const DEPLOYMENT: &str = "\
apiVersion: apps/v1
kind: Deployment
spec:
  template:
    spec:
      containers:
        - name: drupal
          image: __IMAGE_URL__/drupal:__IMAGE_TAG__
        - name: adminer
          image: __IMAGE_URL__/adminer:__IMAGE_TAG__
        - name: cloud-sql-proxy
          args: [\"__INSTANCE_CONNECTION_NAME__\"]
";

    const SERVICE: &str = "\
apiVersion: v1
kind: Service
spec:
  type: LoadBalancer
";

    struct Fixture {
        dir: PathBuf,
        config: Arc<DeployConfig>,
    }

    impl Fixture {
        fn new(deployment: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("keel-seq-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("deployment.yaml"), deployment).unwrap();
            std::fs::write(dir.join("service.yaml"), SERVICE).unwrap();

            let config = DeployConfig {
                project_id: "proj".to_string(),
                artifact_repository: "repo".to_string(),
                sql_instance: "db-instance".to_string(),
                manifest_dir: dir.clone(),
                ..DeployConfig::default()
            };

            Self {
                dir,
                config: Arc::new(config),
            }
        }

        fn context(&self, runner: Arc<dyn CommandRunner>) -> RunContext {
            RunContext::new(
                self.config.clone(),
                BuildId::parse("abc123").unwrap(),
                runner,
            )
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    fn statuses(run: &PipelineRun) -> Vec<StepStatus> {
        run.steps.iter().map(|s| s.status).collect()
    }

    #[tokio::test]
    async fn test_full_pipeline_runs_in_order() {
        let fixture = Fixture::new(DEPLOYMENT);
        let runner = Arc::new(ScriptedRunner::new().respond("gcloud secrets", b"hunter2"));
        let mut ctx = fixture.context(runner.clone());

        let run = Sequencer::standard().run(&mut ctx).await;

        assert_eq!(run.status, RunStatus::Succeeded);
        assert!(statuses(&run).iter().all(|s| *s == StepStatus::Succeeded));

        let commands = runner.commands();
        assert_eq!(
            commands,
            vec![
                "docker build -t us-central1-docker.pkg.dev/proj/repo/drupal:abc123 -f Dockerfile .",
                "docker build -t us-central1-docker.pkg.dev/proj/repo/adminer:abc123 -f adminer/Dockerfile adminer",
                "gcloud container clusters get-credentials drupal-cluster --location=us-central1 --project=proj",
                "gcloud secrets versions access latest --secret=drupal-db-password --project=proj",
                "kubectl apply -f - < [stdin]",
                "kubectl apply -f - < [stdin]",
                "docker push us-central1-docker.pkg.dev/proj/repo/drupal:abc123",
                "docker push us-central1-docker.pkg.dev/proj/repo/adminer:abc123",
            ]
        );

        // The manifest apply carries both rendered documents and no tokens
        let recorded = runner.recorded();
        let applied = recorded[5].stdin.as_deref().unwrap();
        assert!(applied.contains("image: us-central1-docker.pkg.dev/proj/repo/drupal:abc123"));
        assert!(applied.contains("[\"proj:us-central1:db-instance\"]"));
        assert!(applied.contains("kind: Service"));
        assert!(!applied.contains("__"));

        // The secret never reaches a log entry
        assert!(
            run.steps
                .iter()
                .flat_map(|s| &s.logs)
                .all(|entry| !entry.message.contains("hunter2"))
        );
    }

    #[tokio::test]
    async fn test_halts_on_first_failure() {
        let fixture = Fixture::new(DEPLOYMENT);
        let runner = Arc::new(ScriptedRunner::new().fail("docker build", 1));
        let mut ctx = fixture.context(runner.clone());

        let run = Sequencer::standard().run(&mut ctx).await;

        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.failed_step().unwrap().kind, StepKind::BuildApp);
        assert_eq!(runner.commands().len(), 1);
        assert!(!runner.ran("adminer"));
        assert_eq!(statuses(&run)[1..], [StepStatus::Skipped; 7]);
    }

    #[tokio::test]
    async fn test_fetch_failure_never_publishes() {
        let fixture = Fixture::new(DEPLOYMENT);
        let runner = Arc::new(ScriptedRunner::new().unreachable("gcloud secrets"));
        let mut ctx = fixture.context(runner.clone());

        let run = Sequencer::standard().run(&mut ctx).await;

        assert_eq!(run.status, RunStatus::Failed);
        let failed = run.failed_step().unwrap();
        assert_eq!(failed.kind, StepKind::FetchSecret);
        assert!(failed.error_message.is_some());

        assert!(!runner.ran("kubectl"));
        assert_eq!(
            run.step(StepKind::PublishSecret).unwrap().status,
            StepStatus::Skipped
        );
        assert_eq!(
            run.step(StepKind::PushImages).unwrap().status,
            StepStatus::Skipped
        );
    }

    #[tokio::test]
    async fn test_unresolved_token_fails_before_cluster_is_touched() {
        let fixture = Fixture::new("image: __IMAGE_URL__/drupal:__IMAGE_VERSION__\n");
        let runner = Arc::new(ScriptedRunner::new().respond("gcloud secrets", b"hunter2"));
        let mut ctx = fixture.context(runner.clone());

        let run = Sequencer::standard().run(&mut ctx).await;

        let failed = run.failed_step().unwrap();
        assert_eq!(failed.kind, StepKind::Render);
        assert!(
            failed
                .error_message
                .as_deref()
                .unwrap()
                .contains("__IMAGE_VERSION__")
        );
        assert!(!runner.ran("gcloud secrets"));
        assert!(!runner.ran("kubectl"));
    }

    #[tokio::test]
    async fn test_unmet_dependency_fails_step() {
        let fixture = Fixture::new(DEPLOYMENT);
        let runner = Arc::new(ScriptedRunner::new());
        let mut ctx = fixture.context(runner.clone());

        let sequencer = Sequencer::new(vec![Box::new(PublishSecretStep)]);
        let run = sequencer.run(&mut ctx).await;

        assert_eq!(run.status, RunStatus::Failed);
        let failed = run.failed_step().unwrap();
        assert_eq!(failed.kind, StepKind::PublishSecret);
        assert!(
            failed
                .error_message
                .as_deref()
                .unwrap()
                .contains("Fetch-Secret")
        );
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_step_logs_are_attached() {
        let fixture = Fixture::new(DEPLOYMENT);
        let runner = Arc::new(ScriptedRunner::new().fail("get-credentials", 1));
        let mut ctx = fixture.context(runner);

        let run = Sequencer::standard().run(&mut ctx).await;

        let auth = run.step(StepKind::Authenticate).unwrap();
        assert_eq!(auth.status, StepStatus::Failed);
        assert!(
            auth.logs
                .iter()
                .any(|entry| entry.message.starts_with("$ gcloud container clusters"))
        );
        let build = run.step(StepKind::BuildApp).unwrap();
        assert!(
            build
                .logs
                .iter()
                .all(|entry| !entry.message.contains("gcloud"))
        );
    }

    #[test]
    fn test_plan_lists_every_step() {
        let fixture = Fixture::new(DEPLOYMENT);
        let build_id = BuildId::parse("abc123").unwrap();

        let plan = Sequencer::standard().plan(&fixture.config, &build_id);
        let kinds: Vec<_> = plan.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, StepKind::ALL.to_vec());

        let push = &plan[7].1;
        assert_eq!(push.len(), 2);
        assert!(plan.iter().all(|(_, lines)| !lines.is_empty()));
    }
}
