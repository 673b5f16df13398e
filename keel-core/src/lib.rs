//! Keel Core
//!
//! Core types for the Keel deployment pipeline.
//!
//! This crate contains:
//! - Domain types: build identifiers, secrets, run and step records
//! - Manifest rendering: placeholder substitution with unresolved-token checks
//! - Error types shared by the runner and the CLI

pub mod domain;
pub mod error;
pub mod manifest;

pub use domain::build_id::BuildId;
pub use error::{BuildIdError, RenderError, SecretError};
