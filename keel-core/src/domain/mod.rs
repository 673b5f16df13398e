//! Core domain types
//!
//! These types describe a single pipeline run: the build it belongs to,
//! the steps it executes, the logs they produce and the secret material
//! they pass along. They are shared between the runner (which fills them
//! in) and the CLI (which reports on them).

pub mod build_id;
pub mod log;
pub mod run;
pub mod secret;
pub mod step;
