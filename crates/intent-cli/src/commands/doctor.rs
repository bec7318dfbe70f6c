//! `intent doctor`
//!
//! Every problem is printed with its code and a concrete fix. Warnings are
//! shown but do not fail the run.

use colored::Colorize;
use intent_core::reconcile::{self, PinStatus};
use intent_core::{FileState, check_versions, detect_all, lint_workflow, read_requires_python};
use intent_fs::Filesystem;
use intent_meta::{Code, IntentConfig};

use crate::context::ProjectContext;
use crate::error::{EXIT_FAILURE, EXIT_OK, EXIT_USAGE, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One problem and how to fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Code,
    pub message: String,
    pub fix: String,
}

impl Diagnostic {
    fn error(code: Code, message: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            fix: fix.into(),
        }
    }

    fn warning(code: Code, message: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message, fix)
        }
    }

    fn print(&self) {
        let code = format!("[{}]", self.code);
        match self.severity {
            Severity::Error => println!("{} {}", code.red().bold(), self.message),
            Severity::Warning => println!("{} Warning: {}", code.yellow().bold(), self.message),
        }
        println!("  Fix: {}", self.fix);
    }
}

/// Run the doctor command
pub fn run_doctor(ctx: &ProjectContext) -> Result<u8> {
    let path = ctx.config_path();
    if path.is_contained() && !ctx.has_config() {
        Diagnostic::error(
            Code::ConfigMissing,
            format!("{path} not found"),
            "run `intent init` to create one.",
        )
        .print();
        return Ok(EXIT_USAGE);
    }

    let config = match ctx.load() {
        Ok(config) => config,
        Err(e) => {
            Diagnostic::error(
                e.code().unwrap_or(Code::ConfigInvalid),
                e.to_string(),
                format!("correct {path} and re-run `intent doctor`."),
            )
            .print();
            return Ok(EXIT_USAGE);
        }
    };

    let diagnostics = diagnose(ctx.fs(), &config)?;
    for diagnostic in &diagnostics {
        diagnostic.print();
    }

    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        Ok(EXIT_FAILURE)
    } else {
        let warnings = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        println!("{}", clean_summary(warnings).green());
        Ok(EXIT_OK)
    }
}

/// Closing line of an error-free run.
fn clean_summary(warnings: usize) -> String {
    match warnings {
        0 => "No issues found.".to_string(),
        1 => "No errors found (1 warning).".to_string(),
        n => format!("No errors found ({n} warnings)."),
    }
}

/// Inspect a loaded project without modifying it.
pub fn diagnose(fs: &dyn Filesystem, config: &IntentConfig) -> Result<Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();

    let status = read_requires_python(fs)?;
    let versions = check_versions(config, &status, config.policy.strict);
    let reconcile_fix = "run `intent reconcile --plan` to see how to align the pin files.";
    if !versions.ok {
        diagnostics.push(Diagnostic::error(versions.code, versions.message, reconcile_fix));
    } else if versions.code == Code::VersionBroader {
        diagnostics.push(Diagnostic::warning(versions.code, versions.message, reconcile_fix));
    }

    for file in detect_all(fs, config)? {
        let fix = match file.state {
            FileState::UpToDate => continue,
            FileState::Missing | FileState::OutOfDate => "run `intent sync --write`.".to_string(),
            FileState::Unowned => format!(
                "move {} aside, or run `intent sync --write --force` to replace it.",
                file.path
            ),
        };
        diagnostics.push(Diagnostic::error(file.code, file.message, fix));
    }

    for pin in reconcile::plan(fs, config)?.pins {
        if let PinStatus::Drift { .. } = pin.status {
            diagnostics.push(Diagnostic::error(
                pin.status.code(),
                pin.describe(),
                "run `intent reconcile --apply --allow-existing`.",
            ));
        }
    }

    for finding in lint_workflow(config) {
        let fix = "run `intent lint-workflow` for details.";
        diagnostics.push(if config.policy.workflow_lint_strict {
            Diagnostic::error(finding.code, finding.message, fix)
        } else {
            Diagnostic::warning(finding.code, finding.message, fix)
        });
    }

    Ok(diagnostics)
}
