//! GitHub Actions workflow rendering.
//!
//! Without `[[ci.jobs]]` a single `ci` job installs the project and runs
//! every declared command in order. With custom jobs each job is rendered
//! as declared, artifact uploads are appended to every job, and an enabled
//! summary adds an `intent_summary` job that needs all of them.
//!
//! The workflow is built as a [`serde_yaml::Value`] and serialized in one
//! pass, so every user-supplied string is quoted by the YAML emitter.

use std::collections::BTreeMap;

use intent_meta::{
    CacheMode, CiArtifact, CiJob, CiStep, CommandTable, IntentConfig, SUMMARY_JOB_NAME, Scalar,
    StepAction,
};
use serde_yaml::{Mapping, Value};
use tracing::{debug, error};

use crate::{BANNER, GENERATED_MARKER};

const CHECKOUT: &str = "actions/checkout@v4";
const SETUP_PYTHON: &str = "actions/setup-python@v5";
const UPLOAD_ARTIFACT: &str = "actions/upload-artifact@v4";
const DEFAULT_TRIGGER: &str = "push";
const DEFAULT_JOB_NAME: &str = "ci";
const MATRIX_PYTHON: &str = "${{ matrix.python-version }}";

/// Script run by the summary step: publish `report.summary_markdown` from
/// `intent check --format json` to the step summary, tolerating failures.
const SUMMARY_SCRIPT: &[&str] = &[
    "intent check --format json > intent-check.json || true",
    "python - <<'PY'",
    "import json",
    "import os",
    "from pathlib import Path",
    "payload = json.loads(Path('intent-check.json').read_text(encoding='utf-8'))",
    "report = payload.get('report') or {}",
    "summary = report.get('summary_markdown')",
    "summary_path = os.environ.get('GITHUB_STEP_SUMMARY')",
    "if summary and summary_path:",
    "    Path(summary_path).write_text(summary + '\\n', encoding='utf-8')",
    "PY",
];

/// Render `.github/workflows/ci.yml`.
pub fn render_ci(config: &IntentConfig) -> String {
    // A tree of strings, numbers and mappings always serializes
    let body = match serde_yaml::to_string(&workflow(config)) {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, "Failed to serialize workflow");
            String::new()
        }
    };
    crate::finish(vec![
        GENERATED_MARKER.to_string(),
        BANNER.to_string(),
        String::new(),
        body,
    ])
}

/// The workflow document; key order follows insertion order.
fn workflow(config: &IntentConfig) -> Value {
    let ci = &config.ci;
    let triggers: Vec<Value> = if ci.triggers.is_empty() {
        vec![Value::from(DEFAULT_TRIGGER)]
    } else {
        ci.triggers.iter().map(|t| Value::from(t.as_str())).collect()
    };

    let mut jobs = Mapping::new();
    if ci.jobs.is_empty() {
        debug!("Rendering default workflow job");
        let job = default_job(config);
        jobs.insert(Value::from(job.name.as_str()), job_value(&job, &config.commands));
    } else {
        debug!(jobs = ci.jobs.len(), "Rendering custom workflow jobs");
        for job in &ci.jobs {
            let mut job = job.clone();
            job.steps.extend(ci.artifacts.iter().map(artifact_step));
            jobs.insert(Value::from(job.name.as_str()), job_value(&job, &config.commands));
        }
        if ci.summary_enabled() {
            let job = summary_job(config);
            jobs.insert(Value::from(job.name.as_str()), job_value(&job, &config.commands));
        }
    }

    let mut doc = Mapping::new();
    doc.insert("name".into(), "CI".into());
    doc.insert("on".into(), Value::Sequence(triggers));
    doc.insert("jobs".into(), Value::Mapping(jobs));
    Value::Mapping(doc)
}

fn default_job(config: &IntentConfig) -> CiJob {
    let ci = &config.ci;
    let mut job = CiJob::new(DEFAULT_JOB_NAME);

    let python = match &ci.python_versions {
        Some(versions) => {
            job.matrix = BTreeMap::from([(
                "python-version".to_string(),
                versions.iter().cloned().map(Scalar::String).collect(),
            )]);
            MATRIX_PYTHON.to_string()
        }
        None => config.python_version.clone(),
    };
    let mut setup = CiStep::uses(SETUP_PYTHON).with_input("python-version", Scalar::String(python));
    if ci.cache == CacheMode::Pip {
        setup = setup.with_input("cache", Scalar::String("pip".into()));
    }

    job.steps = vec![
        CiStep::uses(CHECKOUT),
        setup,
        CiStep::run(install_script(&ci.install)).named("Install dependencies"),
    ];
    job.steps.extend(
        config
            .commands
            .iter()
            .map(|(name, _)| CiStep::new(StepAction::Command(name.to_string())).named(name)),
    );
    job.steps.extend(ci.artifacts.iter().map(artifact_step));
    if ci.summary_enabled() {
        job.steps.push(summary_step());
    }
    job
}

fn job_value(job: &CiJob, commands: &CommandTable) -> Value {
    let mut map = Mapping::new();
    map.insert("runs-on".into(), job.runs_on.as_str().into());
    if let Some(condition) = &job.if_condition {
        map.insert("if".into(), condition.as_str().into());
    }
    if job.continue_on_error {
        map.insert("continue-on-error".into(), true.into());
    }
    if let Some(minutes) = job.timeout_minutes {
        map.insert("timeout-minutes".into(), minutes.into());
    }
    if !job.needs.is_empty() {
        let mut needs: Vec<&str> = job.needs.iter().map(String::as_str).collect();
        needs.sort_unstable();
        map.insert("needs".into(), needs.into_iter().map(Value::from).collect());
    }
    if !job.matrix.is_empty() {
        let mut matrix = Mapping::new();
        for (key, values) in &job.matrix {
            matrix.insert(key.as_str().into(), values.iter().map(scalar).collect());
        }
        let mut strategy = Mapping::new();
        strategy.insert("fail-fast".into(), false.into());
        strategy.insert("matrix".into(), Value::Mapping(matrix));
        map.insert("strategy".into(), Value::Mapping(strategy));
    }
    map.insert(
        "steps".into(),
        job.steps.iter().map(|step| step_value(step, commands)).collect(),
    );
    Value::Mapping(map)
}

fn step_value(step: &CiStep, commands: &CommandTable) -> Value {
    let mut map = Mapping::new();
    if let Some(name) = &step.name {
        map.insert("name".into(), name.as_str().into());
    }
    if let Some(condition) = &step.if_condition {
        map.insert("if".into(), condition.as_str().into());
    }
    if step.continue_on_error {
        map.insert("continue-on-error".into(), true.into());
    }
    if let Some(dir) = &step.working_directory {
        map.insert("working-directory".into(), dir.as_str().into());
    }
    if !step.env.is_empty() {
        map.insert("env".into(), scalar_map(&step.env));
    }

    match &step.action {
        StepAction::Uses { uses, with } => {
            map.insert("uses".into(), uses.as_str().into());
            if !with.is_empty() {
                map.insert("with".into(), scalar_map(with));
            }
        }
        StepAction::Run(script) => {
            map.insert("run".into(), script_value(script));
        }
        StepAction::Command(name) => {
            // The loader guarantees the reference resolves
            let script = commands.get(name).unwrap_or_default();
            map.insert("run".into(), script_value(script));
        }
    }
    Value::Mapping(map)
}

fn scalar(value: &Scalar) -> Value {
    match value {
        Scalar::Bool(b) => Value::from(*b),
        Scalar::Integer(i) => Value::from(*i),
        Scalar::Float(f) => Value::from(*f),
        Scalar::String(s) => Value::from(s.as_str()),
    }
}

fn scalar_map(values: &BTreeMap<String, Scalar>) -> Value {
    Value::Mapping(
        values
            .iter()
            .map(|(key, value)| (Value::from(key.as_str()), scalar(value)))
            .collect(),
    )
}

/// Scripts end with exactly one newline so the emitter writes a `|` block.
fn script_value(script: &str) -> Value {
    Value::from(format!("{}\n", script.trim_end()))
}

fn install_script(install: &str) -> String {
    format!("python -m pip install -U pip\npython -m pip install {install}")
}

fn artifact_step(artifact: &CiArtifact) -> CiStep {
    let mut step = CiStep::uses(UPLOAD_ARTIFACT)
        .named(format!("Upload artifact: {}", artifact.name))
        .when(artifact.when.expression())
        .with_input("name", Scalar::String(artifact.name.clone()))
        .with_input("path", Scalar::String(artifact.path.clone()));
    if let Some(days) = artifact.retention_days {
        step = step.with_input("retention-days", Scalar::Integer(i64::from(days)));
    }
    step
}

fn summary_step() -> CiStep {
    CiStep::run(SUMMARY_SCRIPT.join("\n"))
        .named("Write intent summary")
        .when("${{ always() }}")
}

fn summary_job(config: &IntentConfig) -> CiJob {
    let mut job = CiJob::new(SUMMARY_JOB_NAME);
    job.needs = config.ci.jobs.iter().map(|j| j.name.clone()).collect();
    job.needs.sort();
    job.steps = vec![
        CiStep::uses(CHECKOUT),
        CiStep::uses(SETUP_PYTHON)
            .with_input("python-version", Scalar::String(config.python_version.clone())),
        CiStep::run(install_script(&config.ci.install)),
        summary_step(),
    ];
    job
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_artifact_step_carries_retention_as_integer() {
        let step = artifact_step(&CiArtifact {
            name: "junit".into(),
            path: "reports/junit.xml".into(),
            retention_days: Some(7),
            when: intent_meta::ArtifactWhen::OnFailure,
        });
        assert_eq!(step.if_condition.as_deref(), Some("${{ failure() }}"));
        let StepAction::Uses { with, .. } = &step.action else {
            panic!("expected uses step");
        };
        assert_eq!(with.get("retention-days"), Some(&Scalar::Integer(7)));
    }

    #[rstest]
    #[case("pytest -q", "pytest -q\n")]
    #[case("pytest -q\n\n\n", "pytest -q\n")]
    #[case("a\n\nb", "a\n\nb\n")]
    fn test_script_value_ends_with_one_newline(#[case] script: &str, #[case] expected: &str) {
        assert_eq!(script_value(script), Value::from(expected));
    }

    #[rstest]
    #[case(Scalar::Bool(true), Value::Bool(true))]
    #[case(Scalar::Integer(3), Value::from(3_i64))]
    #[case(Scalar::String("3.10".into()), Value::from("3.10"))]
    fn test_scalar_keeps_its_type(#[case] input: Scalar, #[case] expected: Value) {
        assert_eq!(scalar(&input), expected);
    }
}
