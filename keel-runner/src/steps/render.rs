//! Manifest rendering step

use async_trait::async_trait;
use keel_core::BuildId;
use keel_core::domain::step::StepKind;
use keel_core::manifest::{Manifest, RenderedManifest};
use std::path::Path;

use super::{Step, StepError};
use crate::config::DeployConfig;
use crate::context::RunContext;

/// Loads every `*.yaml` / `*.yml` file of a directory, sorted by file name
pub fn load_manifests(dir: &Path) -> Result<Vec<Manifest>, StepError> {
    let read_error = |source: std::io::Error| StepError::Manifests {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_yaml && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(StepError::NoManifests(dir.to_path_buf()));
    }

    paths
        .into_iter()
        .map(|path| {
            let content = std::fs::read_to_string(&path).map_err(|source| StepError::Manifests {
                path: path.clone(),
                source,
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(Manifest::new(name, content))
        })
        .collect()
}

/// Loads and renders the configured manifests for a build
pub fn render_manifests(
    config: &DeployConfig,
    build_id: &BuildId,
) -> Result<Vec<RenderedManifest>, StepError> {
    let placeholders = config.placeholders(build_id);

    load_manifests(&config.manifest_dir)?
        .iter()
        .map(|manifest| manifest.render(&placeholders).map_err(StepError::from))
        .collect()
}

/// Substitutes the placeholder tokens in every manifest
///
/// Fails on the first token that has no value, before anything reaches the
/// cluster.
pub struct RenderStep;

#[async_trait]
impl Step for RenderStep {
    fn kind(&self) -> StepKind {
        StepKind::Render
    }

    fn describe(&self, config: &DeployConfig, build_id: &BuildId) -> Vec<String> {
        config
            .placeholders(build_id)
            .iter()
            .map(|(token, value)| {
                format!(
                    "substitute __{}__ = {} in {}",
                    token,
                    value,
                    config.manifest_dir.display()
                )
            })
            .collect()
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), StepError> {
        let rendered = render_manifests(&ctx.config, &ctx.build_id)?;

        for manifest in &rendered {
            ctx.log_info(format!(
                "Rendered {} ({} substitution(s))",
                manifest.name, manifest.substitutions
            ));
        }

        ctx.set_rendered(rendered);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn manifest_dir(files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("keel-render-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }
        dir
    }

    fn config(dir: PathBuf) -> DeployConfig {
        DeployConfig {
            project_id: "proj".to_string(),
            artifact_repository: "repo".to_string(),
            sql_instance: "db-instance".to_string(),
            manifest_dir: dir,
            ..DeployConfig::default()
        }
    }

    #[test]
    fn test_load_manifests_sorted_yaml_only() {
        let dir = manifest_dir(&[
            ("service.yaml", "kind: Service\n"),
            ("deployment.yml", "kind: Deployment\n"),
            ("README.md", "# notes\n"),
        ]);

        let manifests = load_manifests(&dir).unwrap();
        let names: Vec<_> = manifests.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["deployment.yml", "service.yaml"]);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_manifests_empty_dir() {
        let dir = manifest_dir(&[]);
        assert!(matches!(
            load_manifests(&dir),
            Err(StepError::NoManifests(_))
        ));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_manifests_missing_dir() {
        let dir = std::env::temp_dir().join(format!("keel-missing-{}", uuid::Uuid::new_v4()));
        assert!(matches!(
            load_manifests(&dir),
            Err(StepError::Manifests { .. })
        ));
    }

    #[test]
    fn test_render_manifests_end_to_end() {
        let dir = manifest_dir(&[
            (
                "deployment.yaml",
                "image: __IMAGE_URL__/drupal:__IMAGE_TAG__\nconnection: __INSTANCE_CONNECTION_NAME__\n",
            ),
            ("service.yaml", "kind: Service\nport: 80\n"),
        ]);
        let build_id = BuildId::parse("abc123").unwrap();

        let rendered = render_manifests(&config(dir.clone()), &build_id).unwrap();
        assert_eq!(
            rendered[0].content,
            "image: us-central1-docker.pkg.dev/proj/repo/drupal:abc123\nconnection: proj:us-central1:db-instance\n"
        );
        assert_eq!(rendered[1].content, "kind: Service\nport: 80\n");
        assert!(rendered.iter().all(|m| Manifest::new("", m.content.clone())
            .placeholders()
            .is_empty()));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_render_manifests_rejects_unknown_token() {
        let dir = manifest_dir(&[("deployment.yaml", "replicas: __REPLICAS__\n")]);
        let build_id = BuildId::parse("abc123").unwrap();

        let err = render_manifests(&config(dir.clone()), &build_id).unwrap_err();
        assert!(err.to_string().contains("__REPLICAS__"));

        std::fs::remove_dir_all(dir).unwrap();
    }
}
