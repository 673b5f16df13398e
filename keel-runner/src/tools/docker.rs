//! Docker image build and push

use std::path::Path;

use crate::process::CommandSpec;

/// `docker build -t <image> -f <dockerfile> <context>`
pub fn build(image_ref: &str, dockerfile: &Path, context: &Path) -> CommandSpec {
    CommandSpec::new("docker").args([
        "build".to_string(),
        "-t".to_string(),
        image_ref.to_string(),
        "-f".to_string(),
        dockerfile.display().to_string(),
        context.display().to_string(),
    ])
}

/// `docker push <image>`
pub fn push(image_ref: &str) -> CommandSpec {
    CommandSpec::new("docker").args(["push", image_ref])
}
