//! Execution context for a pipeline run
//!
//! Contains all state the steps share during a run:
//! - The deployment configuration and build id
//! - The command runner used to reach external tools
//! - Typed outputs handed from one step to the next (rendered manifests,
//!   fetched secret)
//! - The log buffer of the step currently running

use keel_core::BuildId;
use keel_core::domain::log::{LogEntry, LogLevel};
use keel_core::domain::secret::SecretMaterial;
use keel_core::manifest::RenderedManifest;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::DeployConfig;
use crate::process::{CommandOutput, CommandRunner, CommandSpec, ProcessError, run_checked};
use crate::service::{InMemoryLogBuffer, LogBufferService};

/// Execution context shared across the steps of one run
pub struct RunContext {
    pub config: Arc<DeployConfig>,
    pub build_id: BuildId,

    runner: Arc<dyn CommandRunner>,
    log_buffer: InMemoryLogBuffer,

    /// Set by the render step, consumed by the apply step
    rendered: Vec<RenderedManifest>,

    /// Set by the fetch step, consumed once by the publish step
    secret: Option<SecretMaterial>,
}

impl RunContext {
    pub fn new(
        config: Arc<DeployConfig>,
        build_id: BuildId,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            config,
            build_id,
            runner,
            log_buffer: InMemoryLogBuffer::new(),
            rendered: Vec::new(),
            secret: None,
        }
    }

    /// Runs a command, logging the command line and its output
    ///
    /// Output of redacted commands is never logged.
    pub async fn exec(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        self.log_info(format!("$ {}", command.display()));

        let result = run_checked(self.runner.as_ref(), command).await;

        match &result {
            Ok(output) if !command.redact_output => {
                self.log_output(&output.stdout_lossy(), LogLevel::Info);
                self.log_output(&output.stderr, LogLevel::Warning);
            }
            Ok(_) => self.log_debug("Output redacted".to_string()),
            Err(e) => self.log_error(e.to_string()),
        }

        result
    }

    pub fn set_rendered(&mut self, manifests: Vec<RenderedManifest>) {
        self.rendered = manifests;
    }

    pub fn rendered(&self) -> &[RenderedManifest] {
        &self.rendered
    }

    pub fn set_secret(&mut self, secret: SecretMaterial) {
        self.secret = Some(secret);
    }

    /// Takes the fetched secret out of the context
    ///
    /// Returns None if it was never fetched or was already consumed.
    pub fn take_secret(&mut self) -> Option<SecretMaterial> {
        self.secret.take()
    }

    /// Logs a debug message
    pub fn log_debug(&self, message: String) {
        debug!("{}", message);
        self.log_buffer
            .add_entry(LogEntry::now(LogLevel::Debug, message));
    }

    /// Logs an info message
    pub fn log_info(&self, message: String) {
        info!("{}", message);
        self.log_buffer.add_entry(LogEntry::now(LogLevel::Info, message));
    }

    /// Logs a warning message
    pub fn log_warning(&self, message: String) {
        warn!("{}", message);
        self.log_buffer
            .add_entry(LogEntry::now(LogLevel::Warning, message));
    }

    /// Logs an error message
    pub fn log_error(&self, message: String) {
        error!("{}", message);
        self.log_buffer
            .add_entry(LogEntry::now(LogLevel::Error, message));
    }

    /// Drains all log entries collected since the last drain
    pub fn drain_logs(&self) -> Vec<LogEntry> {
        self.log_buffer.drain()
    }

    fn log_output(&self, output: &str, level: LogLevel) {
        for line in output.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
            match level {
                LogLevel::Debug => self.log_debug(line.to_string()),
                LogLevel::Info => self.log_info(line.to_string()),
                LogLevel::Warning => self.log_warning(line.to_string()),
                LogLevel::Error => self.log_error(line.to_string()),
            }
        }
    }
}
