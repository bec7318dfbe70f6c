//! Scripted command runner.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

use intent_checks::{CommandOutput, CommandRunner, Error, Result};

#[derive(Debug, Clone)]
enum Reply {
    Output(CommandOutput),
    Timeout,
}

/// Replays fixed replies keyed by shell string and records every call.
///
/// Unscripted commands fail as if the shell could not be spawned.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    replies: HashMap<String, Reply>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, shell: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.replies.insert(
            shell.to_string(),
            Reply::Output(CommandOutput {
                exit_code: Some(exit_code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
        );
        self
    }

    /// Exit 0 with `stdout` as the JSON payload.
    pub fn json(self, shell: &str, stdout: &str) -> Self {
        self.respond(shell, 0, stdout, "")
    }

    /// Fail with a timeout at whatever bound the caller passes.
    pub fn timeout(mut self, shell: &str) -> Self {
        self.replies.insert(shell.to_string(), Reply::Timeout);
        self
    }

    /// Commands run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, shell: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == shell).count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &str, timeout: Duration) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(command.to_string());
        match self.replies.get(command) {
            Some(Reply::Output(output)) => Ok(output.clone()),
            Some(Reply::Timeout) => Err(Error::Timeout {
                command: command.to_string(),
                timeout,
            }),
            None => Err(Error::Spawn {
                command: command.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "command not scripted"),
            }),
        }
    }
}
