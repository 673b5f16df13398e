//! Keel Runner
//!
//! Executes the deployment pipeline: builds the images, authenticates to
//! the cluster, renders the manifests, moves the database password from the
//! secret store into a cluster secret, applies the manifests and pushes the
//! images.
//!
//! Architecture:
//! - Configuration: one explicit [`DeployConfig`] passed to every step
//! - Process: external tools run through the [`CommandRunner`] seam
//! - Steps: one type per pipeline step, sharing a typed [`RunContext`]
//! - Services: sequencing, step log buffering and run history

pub mod config;
pub mod context;
pub mod process;
pub mod service;
pub mod steps;
pub mod tools;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, DeployConfig, ImageConfig};
pub use context::RunContext;
pub use process::{CommandRunner, CommandSpec, SystemRunner};
pub use service::{JsonlHistory, RunHistory, Sequencer};
