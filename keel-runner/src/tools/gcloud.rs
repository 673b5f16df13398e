//! gcloud invocations: cluster credentials and secret access

use crate::process::CommandSpec;

/// Fetches cluster credentials into the local kubeconfig
///
/// Every later kubectl call targets this cluster.
pub fn get_credentials(cluster: &str, location: &str, project: &str) -> CommandSpec {
    CommandSpec::new("gcloud").args([
        "container".to_string(),
        "clusters".to_string(),
        "get-credentials".to_string(),
        cluster.to_string(),
        format!("--location={}", location),
        format!("--project={}", project),
    ])
}

/// Reads the latest version of a secret
///
/// The payload is written raw to stdout, so the command is redacted.
pub fn access_secret(secret: &str, project: &str) -> CommandSpec {
    CommandSpec::new("gcloud")
        .args([
            "secrets".to_string(),
            "versions".to_string(),
            "access".to_string(),
            "latest".to_string(),
            format!("--secret={}", secret),
            format!("--project={}", project),
        ])
        .redacted()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_secret_is_redacted() {
        let spec = access_secret("drupal-db-password", "proj");
        assert!(spec.redact_output);
        assert_eq!(
            spec.display(),
            "gcloud secrets versions access latest --secret=drupal-db-password --project=proj"
        );
    }
}
