//! `intent reconcile`

use colored::Colorize;
use intent_core::reconcile::{self, ApplyOutcome};
use intent_meta::Code;

use crate::context::ProjectContext;
use crate::error::{CliError, EXIT_FAILURE, EXIT_OK, Result};

/// Run the reconcile command
pub fn run_reconcile(
    ctx: &ProjectContext,
    plan: bool,
    apply: bool,
    allow_existing: bool,
) -> Result<u8> {
    if plan == apply {
        return Err(CliError::usage(
            Code::ExclusiveFlags,
            "choose exactly one of --plan or --apply",
        ));
    }

    let config = ctx.load()?;
    println!("Target python version (from intent): {}", config.python_version);

    if plan {
        for pin in reconcile::plan(ctx.fs(), &config)?.pins {
            println!("{}", pin.describe());
            if let Some(action) = &pin.action {
                println!("  -> {action}");
            }
        }
        println!("No files were modified (plan only).");
        return Ok(EXIT_OK);
    }

    let report = reconcile::apply(ctx.fs(), &config, allow_existing)?;
    for (pin, outcome) in &report.results {
        let code = outcome.code(&pin.status);
        match outcome {
            ApplyOutcome::Unchanged => println!("[{code}] {}: aligned", pin.file),
            ApplyOutcome::Created => {
                println!("[{code}] {}: created ({})", pin.file, pin.recommended)
            }
            ApplyOutcome::Updated => {
                println!("[{code}] {}: updated ({})", pin.file, pin.recommended)
            }
            ApplyOutcome::Skipped { reason } => println!(
                "{} {}: skipped ({reason})",
                format!("[{code}]").yellow().bold(),
                pin.file
            ),
        }
    }

    if report.clean() {
        println!("Reconcile apply completed.");
        Ok(EXIT_OK)
    } else {
        println!("Reconcile apply completed with skips; drift remains unresolved.");
        Ok(EXIT_FAILURE)
    }
}
