//! Render command handler

use anyhow::{Context, Result};
use colored::*;
use keel_core::manifest::join_documents;
use keel_runner::steps::render_manifests;
use keel_runner::{DeployConfig, SystemRunner};
use std::fs;
use std::path::PathBuf;

use super::BuildArgs;

/// Render the manifests for a build and print or write them
pub async fn handle_render(
    build: &BuildArgs,
    output: Option<PathBuf>,
    config: DeployConfig,
) -> Result<()> {
    let build_id = build.resolve(&SystemRunner::new()).await?;

    let rendered = render_manifests(&config, &build_id).with_context(|| {
        format!(
            "Failed to render manifests in {}",
            config.manifest_dir.display()
        )
    })?;

    match output {
        None => print!("{}", join_documents(&rendered)),
        Some(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create output directory {:?}", dir))?;

            for manifest in &rendered {
                let path = dir.join(&manifest.name);
                fs::write(&path, &manifest.content)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!(
                    "  {} {} ({} substitution(s))",
                    "Rendered".green(),
                    path.display(),
                    manifest.substitutions
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_output_dir_receives_rendered_manifests() {
        let manifests = temp_dir("keel-cli-manifests");
        fs::create_dir_all(&manifests).unwrap();
        fs::write(
            manifests.join("deployment.yaml"),
            "image: __IMAGE_URL__/drupal:__IMAGE_TAG__\n",
        )
        .unwrap();
        fs::write(manifests.join("service.yaml"), "kind: Service\n").unwrap();

        let config = DeployConfig {
            project_id: "proj".to_string(),
            artifact_repository: "repo".to_string(),
            manifest_dir: manifests.clone(),
            ..DeployConfig::default()
        };
        let build = BuildArgs {
            build_id: Some("abc123".to_string()),
        };
        let output = temp_dir("keel-cli-output").join("nested");

        handle_render(&build, Some(output.clone()), config)
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(output.join("deployment.yaml")).unwrap(),
            "image: us-central1-docker.pkg.dev/proj/repo/drupal:abc123\n"
        );
        assert_eq!(
            fs::read_to_string(output.join("service.yaml")).unwrap(),
            "kind: Service\n"
        );

        fs::remove_dir_all(&manifests).unwrap();
        fs::remove_dir_all(output.parent().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_unresolved_token_writes_nothing() {
        let manifests = temp_dir("keel-cli-manifests");
        fs::create_dir_all(&manifests).unwrap();
        fs::write(manifests.join("deployment.yaml"), "replicas: __REPLICAS__\n").unwrap();

        let config = DeployConfig {
            manifest_dir: manifests.clone(),
            ..DeployConfig::default()
        };
        let build = BuildArgs {
            build_id: Some("abc123".to_string()),
        };
        let output = temp_dir("keel-cli-output");

        let err = handle_render(&build, Some(output.clone()), config)
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("__REPLICAS__"));
        assert!(!output.exists());

        fs::remove_dir_all(&manifests).unwrap();
    }
}
