//! Per-run memoization of command results.

use std::collections::BTreeMap;
use std::time::Duration;

use intent_meta::CommandTable;
use serde_json::Value;
use tracing::{debug, warn};

use crate::runner::{CommandOutput, CommandRunner};

/// The outcome of running one declared command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub name: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Parsed stdout, or the command-level failure reason shared by every
    /// consumer of this command
    pub payload: Result<Value, String>,
}

impl CommandResult {
    pub fn from_output(name: &str, output: CommandOutput) -> Self {
        let payload = match output.exit_code {
            Some(0) => serde_json::from_str(&output.stdout).map_err(|e| {
                format!("command '{name}' produced non-JSON output: {e}")
            }),
            Some(code) => Err(format!("command '{name}' exited with code {code}")),
            None => Err(format!("command '{name}' was terminated by a signal")),
        };
        Self {
            name: name.to_string(),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            payload,
        }
    }

    fn from_failure(name: &str, reason: String) -> Self {
        Self {
            name: name.to_string(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            payload: Err(reason),
        }
    }

    pub fn ok(&self) -> bool {
        self.payload.is_ok()
    }
}

/// Results for each distinct command, each run exactly once.
#[derive(Debug, Default)]
pub struct CommandCache {
    results: BTreeMap<String, CommandResult>,
}

impl CommandCache {
    /// Run each distinct name in `names` once.
    pub fn execute<'a>(
        runner: &dyn CommandRunner,
        commands: &CommandTable,
        names: impl IntoIterator<Item = &'a str>,
        timeout: Duration,
    ) -> Self {
        let mut results = BTreeMap::new();
        for name in names {
            if results.contains_key(name) {
                continue;
            }
            let result = match commands.get(name) {
                Some(shell) => match runner.run(shell, timeout) {
                    Ok(output) => CommandResult::from_output(name, output),
                    Err(e) => CommandResult::from_failure(
                        name,
                        format!("command '{name}' could not run: {e}"),
                    ),
                },
                None => CommandResult::from_failure(
                    name,
                    format!("command '{name}' is not declared"),
                ),
            };
            match &result.payload {
                Ok(_) => debug!(command = name, "Command produced JSON payload"),
                Err(reason) => warn!(command = name, %reason, "Command failed"),
            }
            results.insert(name.to_string(), result);
        }
        Self { results }
    }

    pub fn get(&self, name: &str) -> Option<&CommandResult> {
        self.results.get(name)
    }

    /// The parsed payload for `name`, or its shared failure reason.
    pub fn payload(&self, name: &str) -> Result<&Value, String> {
        match self.results.get(name) {
            Some(result) => result.payload.as_ref().map_err(Clone::clone),
            None => Err(format!("command '{name}' was not run")),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandResult> {
        self.results.values()
    }
}
