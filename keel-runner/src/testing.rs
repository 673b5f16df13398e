//! Test doubles for external tools

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::process::{CommandOutput, CommandRunner, CommandSpec, ProcessError};

enum Behavior {
    Respond(Vec<u8>),
    Fail(i32),
    Unreachable,
}

struct Rule {
    pattern: String,
    behavior: Behavior,
}

/// A command the scripted runner received
#[derive(Debug, Clone)]
pub struct RecordedCommand {
    pub line: String,
    pub stdin: Option<String>,
}

/// Records every command and answers from a script
///
/// Rules match when the command line contains the pattern; the first
/// matching rule wins. Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    recorded: Mutex<Vec<RecordedCommand>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, pattern: &str, stdout: impl AsRef<[u8]>) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            behavior: Behavior::Respond(stdout.as_ref().to_vec()),
        });
        self
    }

    pub fn fail(mut self, pattern: &str, exit_code: i32) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            behavior: Behavior::Fail(exit_code),
        });
        self
    }

    /// Matching commands fail to start, as if the tool or service were missing
    pub fn unreachable(mut self, pattern: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            behavior: Behavior::Unreachable,
        });
        self
    }

    pub fn recorded(&self) -> Vec<RecordedCommand> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.recorded().into_iter().map(|c| c.line).collect()
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.commands().iter().any(|c| c.contains(pattern))
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        let line = command.display();
        self.recorded.lock().unwrap().push(RecordedCommand {
            line: line.clone(),
            stdin: command
                .stdin
                .as_ref()
                .map(|s| s.expose_secret().to_string()),
        });

        let rule = self.rules.iter().find(|r| line.contains(&r.pattern));
        match rule.map(|r| &r.behavior) {
            Some(Behavior::Respond(stdout)) => Ok(CommandOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
                exit_code: 0,
            }),
            Some(Behavior::Fail(exit_code)) => Ok(CommandOutput {
                stdout: Vec::new(),
                stderr: format!("{} failed", command.program),
                exit_code: *exit_code,
            }),
            Some(Behavior::Unreachable) => Err(ProcessError::Spawn {
                program: command.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "unreachable"),
            }),
            None => Ok(CommandOutput {
                stdout: Vec::new(),
                stderr: String::new(),
                exit_code: 0,
            }),
        }
    }
}

/// In-memory cluster that understands `kubectl apply -f -` of JSON documents
///
/// Objects are keyed by `<kind>/<name>`; applying an existing key replaces
/// it, like the real control plane reconciling desired state.
#[derive(Default)]
pub struct FakeCluster {
    objects: Mutex<HashMap<String, serde_json::Value>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, object: serde_json::Value) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), object);
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl CommandRunner for FakeCluster {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        let mut stdout = Vec::new();

        if command.program == "kubectl" {
            if let Some(input) = &command.stdin {
                let object: serde_json::Value =
                    serde_json::from_str(input.expose_secret()).map_err(|e| {
                        ProcessError::Io {
                            program: command.program.clone(),
                            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                        }
                    })?;
                let kind = object["kind"].as_str().unwrap_or_default().to_lowercase();
                let name = object["metadata"]["name"].as_str().unwrap_or_default();
                let key = format!("{}/{}", kind, name);

                let existed = self
                    .objects
                    .lock()
                    .unwrap()
                    .insert(key.clone(), object)
                    .is_some();
                let verb = if existed { "configured" } else { "created" };
                stdout = format!("{} {}\n", key, verb).into_bytes();
            }
        }

        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
            exit_code: 0,
        })
    }
}
