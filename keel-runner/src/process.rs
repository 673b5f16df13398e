//! External process execution
//!
//! Every pipeline step is a blocking invocation of an external tool
//! (docker, gcloud, kubectl, git). Steps describe the invocation as a
//! [`CommandSpec`] and hand it to a [`CommandRunner`], which lets tests swap
//! the real tools for a scripted runner.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tracing::debug;

/// Process execution errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started
    #[error("failed to execute '{program}': {source}. Is it installed?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading output or writing stdin failed
    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited with a non-zero status
    #[error("'{command}' exited with code {exit_code}: {stderr}")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

/// An external command to run
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory, None = current directory
    pub cwd: Option<PathBuf>,
    /// Data written to the process stdin
    pub stdin: Option<Secret<String>>,
    /// Whether stdout carries sensitive data and must not be logged
    pub redact_output: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            stdin: None,
            redact_output: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Pipes sensitive data into the process stdin
    pub fn stdin(mut self, input: Secret<String>) -> Self {
        self.stdin = Some(input);
        self
    }

    /// Keeps the process stdout out of every log stream
    pub fn redacted(mut self) -> Self {
        self.redact_output = true;
        self
    }

    /// Shell-like rendering of the command line, for logs and plans
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push_str(&format!("'{}'", arg));
            } else {
                line.push_str(arg);
            }
        }
        if self.stdin.is_some() {
            line.push_str(" < [stdin]");
        }
        line
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("command", &self.display())
            .field("cwd", &self.cwd)
            .field("redact_output", &self.redact_output)
            .finish()
    }
}

/// Captured result of a finished process
#[derive(Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout decoded lossily, for logging and parsing of non-sensitive output
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

impl fmt::Debug for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandOutput")
            .field("stdout_len", &self.stdout.len())
            .field("stderr", &self.stderr)
            .field("exit_code", &self.exit_code)
            .finish()
    }
}

/// Runs external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion and captures its output
    ///
    /// A non-zero exit code is not an error at this level; see
    /// [`run_checked`].
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError>;
}

/// Runs a command and turns a non-zero exit code into an error
pub async fn run_checked(
    runner: &dyn CommandRunner,
    command: &CommandSpec,
) -> Result<CommandOutput, ProcessError> {
    let output = runner.run(command).await?;

    if !output.success() {
        return Err(ProcessError::NonZeroExit {
            command: command.display(),
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(output)
}

/// Runs commands as local child processes
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        debug!("Executing: {}", command.display());

        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        if let Some(cwd) = &command.cwd {
            process.current_dir(cwd);
        }

        let mut child = process.spawn().map_err(|source| ProcessError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        // Stdin is fed while output is collected, so a tool that exits early
        // still reports its own exit code and stderr
        let feed = write_stdin(child.stdin.take(), command.stdin.as_ref());
        let (written, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.map_err(|source| ProcessError::Io {
            program: command.program.clone(),
            source,
        })?;
        written.map_err(|source| ProcessError::Io {
            program: command.program.clone(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        if command.redact_output {
            debug!(
                "Command finished: exit_code={}, stdout redacted ({} bytes)",
                exit_code,
                output.stdout.len()
            );
        } else {
            debug!(
                "Command finished: exit_code={}, stdout_len={}, stderr_len={}",
                exit_code,
                output.stdout.len(),
                stderr.len()
            );
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr,
            exit_code,
        })
    }
}

/// Writes the input to the child and closes the pipe
///
/// A closed pipe is not an error: the child stopped reading, and its exit
/// status says why.
async fn write_stdin(
    pipe: Option<ChildStdin>,
    input: Option<&Secret<String>>,
) -> std::io::Result<()> {
    let (Some(mut pipe), Some(input)) = (pipe, input) else {
        return Ok(());
    };

    match pipe.write_all(input.expose_secret().as_bytes()).await {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!("Child closed stdin before reading all input");
            Ok(())
        }
        result => result,
    }
}
