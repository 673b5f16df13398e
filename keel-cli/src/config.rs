//! Configuration module
//!
//! Builds the deployment configuration: defaults, then `KEEL_*` environment
//! variables, then command-line flags.

use clap::Args;
use keel_runner::DeployConfig;
use std::path::PathBuf;

/// Per-invocation overrides of the deployment configuration
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Cloud project ID
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Region of the registry and database
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Kubernetes cluster name
    #[arg(long, global = true)]
    pub cluster: Option<String>,

    /// Zone or region of the cluster (defaults to the region)
    #[arg(long, global = true)]
    pub cluster_location: Option<String>,

    /// Artifact registry repository
    #[arg(long, global = true)]
    pub repository: Option<String>,

    /// Cloud SQL instance name
    #[arg(long, global = true)]
    pub sql_instance: Option<String>,

    /// Name of the database password in the secret store
    #[arg(long, global = true)]
    pub secret: Option<String>,

    /// Directory holding the manifest templates
    #[arg(long, global = true)]
    pub manifest_dir: Option<PathBuf>,

    /// Run history file
    #[arg(long, global = true)]
    pub history: Option<PathBuf>,
}

impl ConfigArgs {
    /// Applies the flags over the environment-derived configuration
    pub fn into_config(self) -> DeployConfig {
        self.apply(DeployConfig::from_env())
    }

    /// Applies the flags over an existing configuration
    pub fn apply(self, mut config: DeployConfig) -> DeployConfig {

        if let Some(project) = self.project {
            config.project_id = project;
        }
        if let Some(region) = self.region {
            if self.cluster_location.is_none() {
                config.cluster_location = region.clone();
            }
            config.region = region;
        }
        if let Some(cluster) = self.cluster {
            config.cluster_name = cluster;
        }
        if let Some(location) = self.cluster_location {
            config.cluster_location = location;
        }
        if let Some(repository) = self.repository {
            config.artifact_repository = repository;
        }
        if let Some(instance) = self.sql_instance {
            config.sql_instance = instance;
        }
        if let Some(secret) = self.secret {
            config.secret_name = secret;
        }
        if let Some(dir) = self.manifest_dir {
            config.manifest_dir = dir;
        }
        if let Some(history) = self.history {
            config.history_path = history;
        }

        config
    }
}
