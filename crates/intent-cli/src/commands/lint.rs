//! `intent lint-workflow`

use colored::Colorize;
use intent_core::lint_workflow;

use crate::context::ProjectContext;
use crate::error::{EXIT_FAILURE, EXIT_OK, Result};

/// Run the lint-workflow command
pub fn run_lint_workflow(ctx: &ProjectContext, strict: bool) -> Result<u8> {
    let config = ctx.load()?;
    let strict = strict || config.policy.workflow_lint_strict;

    let findings = lint_workflow(&config);
    if findings.is_empty() {
        println!("No workflow lint warnings.");
        return Ok(EXIT_OK);
    }

    for finding in &findings {
        println!(
            "{} Warning: {}",
            format!("[{}]", finding.code).yellow().bold(),
            finding.message
        );
    }
    Ok(if strict { EXIT_FAILURE } else { EXIT_OK })
}
