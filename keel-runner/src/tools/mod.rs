//! External tool invocations
//!
//! Builders for the exact command lines the pipeline runs. Keeping them in
//! one place means `keel plan` prints precisely what `keel deploy` executes.

pub mod docker;
pub mod gcloud;
pub mod git;
pub mod kubectl;
