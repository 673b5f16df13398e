//! Deployment configuration
//!
//! Defines every parameter the pipeline steps need: the target project and
//! cluster, the images to build, the database instance, the secret names and
//! where the manifests live. One value is built at the entry point and
//! passed to every step; nothing reads ambient shell state after that.

use keel_core::BuildId;
use keel_core::manifest::{IMAGE_TAG, IMAGE_URL, INSTANCE_CONNECTION_NAME, Placeholders};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("{field} '{value}' is invalid: {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// An image built and pushed by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    /// Image name inside the artifact repository (e.g., "drupal")
    pub name: String,
    /// Path to the Dockerfile
    pub dockerfile: PathBuf,
    /// Build context directory
    pub context: PathBuf,
}

/// Deployment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// Cloud project hosting the cluster, registry, database and secrets
    pub project_id: String,

    /// Region of the artifact registry and database (e.g., "us-central1")
    pub region: String,

    /// Name of the Kubernetes cluster
    pub cluster_name: String,

    /// Zone or region of the cluster
    pub cluster_location: String,

    /// Artifact registry repository holding the images
    pub artifact_repository: String,

    /// Application image (Drupal)
    pub app_image: ImageConfig,

    /// Database admin UI image (Adminer)
    pub admin_image: ImageConfig,

    /// Cloud SQL instance name
    pub sql_instance: String,

    /// Name of the database password in the secret store
    pub secret_name: String,

    /// Name of the cluster secret object holding the password
    pub cluster_secret_name: String,

    /// Key of the password inside the cluster secret object
    pub cluster_secret_key: String,

    /// Directory holding the manifest templates
    pub manifest_dir: PathBuf,

    /// JSON Lines file recording every run
    pub history_path: PathBuf,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            region: "us-central1".to_string(),
            cluster_name: "drupal-cluster".to_string(),
            cluster_location: "us-central1".to_string(),
            artifact_repository: "drupal-repo".to_string(),
            app_image: ImageConfig {
                name: "drupal".to_string(),
                dockerfile: PathBuf::from("Dockerfile"),
                context: PathBuf::from("."),
            },
            admin_image: ImageConfig {
                name: "adminer".to_string(),
                dockerfile: PathBuf::from("adminer/Dockerfile"),
                context: PathBuf::from("adminer"),
            },
            sql_instance: "drupal-db".to_string(),
            secret_name: "drupal-db-password".to_string(),
            cluster_secret_name: "drupal-secrets".to_string(),
            cluster_secret_key: "DB_PASSWORD".to_string(),
            manifest_dir: PathBuf::from("k8s"),
            history_path: PathBuf::from(".keel/history.jsonl"),
        }
    }
}

impl DeployConfig {
    /// Creates configuration from environment variables over the defaults
    ///
    /// Recognized environment variables (all optional):
    /// - KEEL_PROJECT_ID
    /// - KEEL_REGION
    /// - KEEL_CLUSTER_NAME
    /// - KEEL_CLUSTER_LOCATION (defaults to the region)
    /// - KEEL_ARTIFACT_REPOSITORY
    /// - KEEL_SQL_INSTANCE
    /// - KEEL_SECRET_NAME
    /// - KEEL_MANIFEST_DIR
    /// - KEEL_HISTORY_PATH
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DeployConfig::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(project_id) = var("KEEL_PROJECT_ID") {
            config.project_id = project_id;
        }
        if let Some(region) = var("KEEL_REGION") {
            config.cluster_location = region.clone();
            config.region = region;
        }
        if let Some(cluster_name) = var("KEEL_CLUSTER_NAME") {
            config.cluster_name = cluster_name;
        }
        if let Some(location) = var("KEEL_CLUSTER_LOCATION") {
            config.cluster_location = location;
        }
        if let Some(repository) = var("KEEL_ARTIFACT_REPOSITORY") {
            config.artifact_repository = repository;
        }
        if let Some(instance) = var("KEEL_SQL_INSTANCE") {
            config.sql_instance = instance;
        }
        if let Some(secret_name) = var("KEEL_SECRET_NAME") {
            config.secret_name = secret_name;
        }
        if let Some(dir) = var("KEEL_MANIFEST_DIR") {
            config.manifest_dir = PathBuf::from(dir);
        }
        if let Some(path) = var("KEEL_HISTORY_PATH") {
            config.history_path = PathBuf::from(path);
        }

        config
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("project_id", &self.project_id),
            ("region", &self.region),
            ("cluster_name", &self.cluster_name),
            ("cluster_location", &self.cluster_location),
            ("artifact_repository", &self.artifact_repository),
            ("app_image.name", &self.app_image.name),
            ("admin_image.name", &self.admin_image.name),
            ("sql_instance", &self.sql_instance),
            ("secret_name", &self.secret_name),
            ("cluster_secret_name", &self.cluster_secret_name),
            ("cluster_secret_key", &self.cluster_secret_key),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(field));
            }
        }

        let lowercase_names = [
            ("project_id", &self.project_id),
            ("region", &self.region),
            ("artifact_repository", &self.artifact_repository),
            ("app_image.name", &self.app_image.name),
            ("admin_image.name", &self.admin_image.name),
            ("cluster_secret_name", &self.cluster_secret_name),
        ];
        for (field, value) in lowercase_names {
            if !value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
            {
                return Err(ConfigError::Invalid {
                    field,
                    value: value.clone(),
                    reason: "only lowercase letters, digits, '-' and '.' are allowed",
                });
            }
        }

        if !self
            .cluster_secret_key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(ConfigError::Invalid {
                field: "cluster_secret_key",
                value: self.cluster_secret_key.clone(),
                reason: "only letters, digits, '-', '_' and '.' are allowed",
            });
        }

        if self.manifest_dir.as_os_str().is_empty() {
            return Err(ConfigError::Empty("manifest_dir"));
        }

        Ok(())
    }

    /// Registry base path, e.g. `us-central1-docker.pkg.dev/proj/repo`
    pub fn registry_path(&self) -> String {
        format!(
            "{}-docker.pkg.dev/{}/{}",
            self.region, self.project_id, self.artifact_repository
        )
    }

    /// Fully qualified reference of an image for the given build
    pub fn image_ref(&self, image: &ImageConfig, build_id: &BuildId) -> String {
        format!("{}/{}:{}", self.registry_path(), image.name, build_id)
    }

    /// Database instance connection name, e.g. `proj:us-central1:db-instance`
    pub fn instance_connection_name(&self) -> String {
        format!("{}:{}:{}", self.project_id, self.region, self.sql_instance)
    }

    /// The token values substituted into the manifests
    pub fn placeholders(&self, build_id: &BuildId) -> Placeholders {
        Placeholders::new()
            .with(IMAGE_URL, self.registry_path())
            .with(IMAGE_TAG, build_id.as_str())
            .with(INSTANCE_CONNECTION_NAME, self.instance_connection_name())
    }
}
