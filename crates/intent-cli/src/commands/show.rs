//! `intent show`

use intent_core::{PyprojectStatus, read_requires_python};
use intent_meta::IntentConfig;
use serde::Serialize;
use serde_json::{Map, Value};

use super::json_error;
use crate::cli::Format;
use crate::context::ProjectContext;
use crate::error::{EXIT_OK, Result};

#[derive(Debug, Serialize)]
struct ShowPayload<'a> {
    ok: bool,
    source: &'a str,
    schema_version: u32,
    python_version: &'a str,
    policy_pack: Option<&'a str>,
    policy_strict: bool,
    workflow_lint_strict: bool,
    commands: Map<String, Value>,
    pyproject: PyprojectView<'a>,
}

#[derive(Debug, Serialize)]
struct PyprojectView<'a> {
    status: &'a PyprojectStatus,
    requires_python: Option<&'a str>,
}

/// Run the show command
pub fn run_show(ctx: &ProjectContext, format: Format) -> Result<u8> {
    let config = match ctx.load() {
        Ok(config) => config,
        Err(e) if format == Format::Json => {
            println!("{}", serde_json::to_string_pretty(&json_error(&e))?);
            return Ok(e.exit_code());
        }
        Err(e) => return Err(e),
    };
    let status = read_requires_python(ctx.fs())?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&payload(&config, &status))?),
        Format::Text => print!("{}", render_text(&config, &status)),
    }
    Ok(EXIT_OK)
}

fn payload<'a>(config: &'a IntentConfig, status: &'a PyprojectStatus) -> ShowPayload<'a> {
    ShowPayload {
        ok: true,
        source: &config.source,
        schema_version: config.schema_version,
        python_version: &config.python_version,
        policy_pack: config.policy.pack.as_deref(),
        policy_strict: config.policy.strict,
        workflow_lint_strict: config.policy.workflow_lint_strict,
        commands: config
            .commands
            .iter()
            .map(|(name, command)| (name.to_string(), Value::from(command)))
            .collect(),
        pyproject: PyprojectView {
            status,
            requires_python: status.spec(),
        },
    }
}

fn render_text(config: &IntentConfig, status: &PyprojectStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("Config: {}\n", config.source));
    out.push_str(&format!("Schema version: {}\n", config.schema_version));
    out.push_str(&format!("Python version: {}\n", config.python_version));
    out.push_str(&format!(
        "Policy pack: {}\n",
        config.policy.pack.as_deref().unwrap_or("none")
    ));
    out.push_str(&format!("Policy strict: {}\n", config.policy.strict));
    out.push_str(&format!(
        "Workflow lint strict: {}\n",
        config.policy.workflow_lint_strict
    ));
    out.push_str("Commands:\n");
    for (name, command) in config.commands.iter() {
        out.push_str(&format!("  {name}: {command}\n"));
    }
    match status.spec() {
        Some(spec) => out.push_str(&format!("pyproject requires-python: {spec}\n")),
        None => out.push_str(&format!("pyproject requires-python: {}\n", status.name())),
    }
    out
}
