//! kubectl invocations

use secrecy::Secret;

use crate::process::CommandSpec;

/// `kubectl apply -f -` with the documents piped through stdin
///
/// Apply reconciles desired state, so it creates missing objects and
/// replaces existing ones.
pub fn apply_stdin(documents: Secret<String>) -> CommandSpec {
    CommandSpec::new("kubectl")
        .args(["apply", "-f", "-"])
        .stdin(documents)
}
