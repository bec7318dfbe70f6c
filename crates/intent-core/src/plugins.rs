//! Plugin hooks
//!
//! `[plugins].check` hooks run during `intent check` and
//! `[plugins].generate` hooks after a successful `intent sync --write`.
//! Hooks run in declaration order through the injected [`CommandRunner`]
//! and stop at the first failure.

use std::fmt;
use std::time::Duration;

use intent_checks::CommandRunner;
use intent_meta::{Code, IntentConfig};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Error;

/// When a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookStage {
    Check,
    Generate,
}

impl HookStage {
    /// Hooks configured for this stage.
    pub fn hooks<'c>(&self, config: &'c IntentConfig) -> &'c [String] {
        match self {
            Self::Check => &config.plugins.check,
            Self::Generate => &config.plugins.generate,
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check => write!(f, "check"),
            Self::Generate => write!(f, "generate"),
        }
    }
}

/// Result of running a single hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookResult {
    pub stage: HookStage,
    pub command: String,
    pub ok: bool,
    /// `None` when the hook could not run or was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub code: Code,
}

impl HookResult {
    /// Diagnostic for a failed hook, including stderr when present.
    pub fn failure_message(&self) -> Option<String> {
        if self.ok {
            return None;
        }
        let status = match (self.code, self.exit_code) {
            (Code::HookError, _) => "could not run".to_string(),
            (_, Some(code)) => format!("exited with code {code}"),
            (_, None) => "was terminated by a signal".to_string(),
        };
        let detail = self.stderr.trim();
        Some(if detail.is_empty() {
            status
        } else {
            format!("{status}: {detail}")
        })
    }
}

/// Results of one stage, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookRun {
    pub results: Vec<HookResult>,
}

impl HookRun {
    pub fn ok(&self) -> bool {
        self.results.iter().all(|r| r.ok)
    }

    /// The failure that stopped the stage, if any.
    pub fn error(&self) -> Option<Error> {
        self.results.iter().find(|r| !r.ok).map(|r| Error::HookFailed {
            stage: r.stage.to_string(),
            command: r.command.clone(),
            message: r.failure_message().unwrap_or_default(),
        })
    }
}

/// Run every hook configured for `stage`.
///
/// Hooks are executed in order. If a hook fails (non-zero exit, spawn error
/// or timeout) execution stops and the failed result is the last one
/// returned.
pub fn run_hooks(
    runner: &dyn CommandRunner,
    config: &IntentConfig,
    stage: HookStage,
) -> HookRun {
    run_commands(runner, stage, stage.hooks(config), config.plugins.timeout)
}

fn run_commands(
    runner: &dyn CommandRunner,
    stage: HookStage,
    hooks: &[String],
    timeout: Duration,
) -> HookRun {
    let mut results = Vec::with_capacity(hooks.len());

    for command in hooks {
        debug!(%stage, %command, "Running plugin hook");
        let result = match runner.run(command, timeout) {
            Ok(output) => HookResult {
                stage,
                command: command.clone(),
                ok: output.success(),
                exit_code: output.exit_code,
                code: if output.success() {
                    Code::HookOk
                } else {
                    Code::HookNonZero
                },
                stdout: output.stdout,
                stderr: output.stderr,
            },
            Err(e) => HookResult {
                stage,
                command: command.clone(),
                ok: false,
                exit_code: None,
                stdout: String::new(),
                stderr: e.to_string(),
                code: Code::HookError,
            },
        };

        let failed = !result.ok;
        results.push(result);
        if failed {
            warn!(%stage, %command, "Plugin hook failed; skipping remaining hooks");
            break;
        }
    }

    HookRun { results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_test_utils::ScriptedRunner;
    use pretty_assertions::assert_eq;

    fn hooks(commands: &[&str]) -> Vec<String> {
        commands.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_hooks_run_in_order() {
        let runner = ScriptedRunner::new()
            .respond("lint", 0, "linted", "")
            .respond("types", 0, "", "");
        let run = run_commands(
            &runner,
            HookStage::Check,
            &hooks(&["lint", "types"]),
            Duration::from_secs(5),
        );

        assert!(run.ok());
        assert!(run.error().is_none());
        assert_eq!(runner.calls(), vec!["lint", "types"]);
        assert_eq!(run.results[0].stdout, "linted");
        assert_eq!(run.results[0].code, Code::HookOk);
    }

    #[test]
    fn test_first_failure_stops_the_stage() {
        let runner = ScriptedRunner::new()
            .respond("first", 3, "", "boom\n")
            .respond("second", 0, "", "");
        let run = run_commands(
            &runner,
            HookStage::Generate,
            &hooks(&["first", "second"]),
            Duration::from_secs(5),
        );

        assert!(!run.ok());
        assert_eq!(runner.calls(), vec!["first"]);
        assert_eq!(run.results.len(), 1);
        assert_eq!(run.results[0].code, Code::HookNonZero);
        assert_eq!(
            run.error().map(|e| e.to_string()).as_deref(),
            Some("generate hook failed: first: exited with code 3: boom")
        );
    }

    #[test]
    fn test_runner_error_is_reported_as_hook_error() {
        let runner = ScriptedRunner::new().timeout("slow");
        let run = run_commands(&runner, HookStage::Check, &hooks(&["slow"]), Duration::from_secs(1));

        let result = &run.results[0];
        assert!(!result.ok);
        assert_eq!(result.exit_code, None);
        assert_eq!(result.code, Code::HookError);
        assert_eq!(
            result.failure_message().as_deref(),
            Some("could not run: 'slow' timed out after 1s")
        );
    }

    #[test]
    fn test_stage_selects_configured_hooks() {
        let mut config = IntentConfig::minimal("3.12", [("test", "pytest -q")]).unwrap();
        config.plugins.check = hooks(&["a"]);
        config.plugins.generate = hooks(&["b", "c"]);

        assert_eq!(HookStage::Check.hooks(&config), ["a".to_string()]);
        assert_eq!(HookStage::Generate.hooks(&config).len(), 2);
        assert_eq!(
            serde_json::to_value(HookStage::Generate).unwrap(),
            serde_json::json!("generate")
        );
    }
}
