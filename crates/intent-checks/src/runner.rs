//! Shell command execution
//!
//! [`CommandRunner`] is the narrow seam the engine and plugin hooks use;
//! tests substitute deterministic fakes for [`ShellRunner`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

/// Captured result of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a shell string and captures its output.
pub trait CommandRunner {
    /// Run `command`, waiting at most `timeout`.
    ///
    /// A non-zero exit is not an error; it is reported through
    /// [`CommandOutput::exit_code`].
    fn run(&self, command: &str, timeout: Duration) -> Result<CommandOutput>;
}

/// Runs commands through the platform shell in a fixed working directory.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    cwd: PathBuf,
}

impl ShellRunner {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    async fn run_bounded(&self, command: &str, timeout: Duration) -> Result<CommandOutput> {
        let mut cmd = shell_command(command);
        cmd.current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| Error::Spawn {
            command: command.to_string(),
            source,
        })?;

        // Dropping the wait future on timeout kills the child
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(CommandOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(source)) => Err(Error::Spawn {
                command: command.to_string(),
                source,
            }),
            Err(_) => Err(Error::Timeout {
                command: command.to_string(),
                timeout,
            }),
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, timeout: Duration) -> Result<CommandOutput> {
        debug!(command, cwd = %self.cwd.display(), "Running command");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;
        let output = runtime.block_on(self.run_bounded(command, timeout))?;
        debug!(command, exit_code = ?output.exit_code, "Command finished");
        Ok(output)
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}
