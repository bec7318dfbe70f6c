//! `intent check`

use colored::Colorize;
use intent_checks::{CheckItem, MetricItem};
use intent_core::{CheckReport, IntentEngine};

use super::json_error;
use crate::cli::Format;
use crate::context::ProjectContext;
use crate::error::{EXIT_FAILURE, EXIT_OK, Result};

/// Run the check command
pub fn run_check(ctx: &ProjectContext, strict: bool, format: Format) -> Result<u8> {
    let config = match ctx.load() {
        Ok(config) => config,
        Err(e) if format == Format::Json => {
            println!("{}", serde_json::to_string_pretty(&json_error(&e))?);
            return Ok(e.exit_code());
        }
        Err(e) => return Err(e),
    };

    let runner = ctx.runner();
    let report = IntentEngine::new(ctx.fs(), &runner).check(&config, strict)?;

    match format {
        Format::Json => println!("{}", report.to_json()?),
        Format::Text => print_text(&report),
    }
    Ok(if report.ok { EXIT_OK } else { EXIT_FAILURE })
}

fn pass(message: &str) {
    println!("{} {message}", "✓".green());
}

fn fail(message: &str) {
    eprintln!("{} {message}", "✗".red());
}

fn print_text(report: &CheckReport) {
    let versions = &report.versions;
    if !versions.ok {
        fail(&versions.message);
    } else if versions.is_note() {
        println!("{}", versions.message);
    } else {
        pass(&versions.message);
    }

    for file in &report.files {
        if file.ok {
            pass(&file.message);
        } else {
            fail(&format!("[{}] {}", file.code, file.message));
        }
    }

    for hook in &report.plugins {
        match hook.failure_message() {
            None => pass(&format!("{} hook: {}", hook.stage, hook.command)),
            Some(message) => fail(&format!(
                "[{}] {} hook failed: {}: {message}",
                hook.code, hook.stage, hook.command
            )),
        }
    }

    for item in &report.checks {
        if item.ok {
            pass(&check_label(item));
        } else {
            fail(&format!(
                "[{}] {}: {}",
                item.code,
                check_label(item),
                item.reason.as_deref().unwrap_or("failed")
            ));
        }
    }

    for metric in &report.report.metrics {
        if metric.ok {
            pass(&metric_label(metric));
        } else {
            fail(&format!(
                "[{}] {}: {}",
                metric.code,
                metric_label(metric),
                metric.reason.as_deref().unwrap_or("failed")
            ));
        }
    }

    if report.has_file_drift() {
        eprintln!("\nHint: run `intent sync --write` to update generated files.");
    }
}

fn check_label(item: &CheckItem) -> String {
    match &item.gate {
        Some(name) => format!("gate '{name}' ({} {})", item.command, item.op),
        None => format!("{} {} {} {}", item.command, item.path, item.op, item.expected),
    }
}

fn metric_label(metric: &MetricItem) -> String {
    match &metric.value {
        Some(value) => format!("metric {}: {value}", metric.label),
        None => format!("metric {}", metric.label),
    }
}
