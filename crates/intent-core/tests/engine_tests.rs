//! Sync and check orchestration over in-memory collaborators.

use intent_core::{Error, IntentEngine, WriteMode, WriteOutcome};
use intent_fs::{Filesystem, NormalizedPath};
use intent_meta::{Code, ConfigLoader, IntentConfig, OperatorTable, PolicyPackRegistry};
use intent_render::Target;
use intent_test_utils::{MemoryFs, ScriptedRunner};
use pretty_assertions::assert_eq;

const BASE: &str = "[python]\nversion = \"3.12\"\n\n[commands]\ntest = \"pytest -q\"\ncoverage = \"cov\"\n";

fn load(extra: &str) -> IntentConfig {
    let packs = PolicyPackRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();
    ConfigLoader::new(&packs, &operators)
        .load_str("intent.toml", &format!("{BASE}\n{extra}"))
        .unwrap()
}

fn synced(config: &IntentConfig) -> MemoryFs {
    let fs = MemoryFs::new();
    for target in Target::ALL {
        fs.write_text(&target.path().path(), &target.render(config)).unwrap();
    }
    fs
}

#[test]
fn test_sync_writes_then_is_idempotent() {
    let cfg = load("");
    let fs = MemoryFs::new();
    let runner = ScriptedRunner::new();
    let engine = IntentEngine::new(&fs, &runner);

    let first = engine.sync(&cfg, WriteMode::Strict).unwrap();
    let outcomes: Vec<WriteOutcome> = first.written.iter().map(|(_, o)| *o).collect();
    assert_eq!(outcomes, vec![WriteOutcome::Created, WriteOutcome::Created]);
    assert_eq!(fs.paths(), vec![".github/workflows/ci.yml", "justfile"]);

    let second = engine.sync(&cfg, WriteMode::Strict).unwrap();
    assert!(second.written.iter().all(|(_, o)| *o == WriteOutcome::Unchanged));
    assert_eq!(fs.writes(), 2);
}

#[test]
fn test_sync_refuses_foreign_justfile_after_writing_workflow() {
    let cfg = load("[plugins]\ngenerate = [\"post\"]\n");
    let fs = MemoryFs::new().with_file("justfile", "test:\n    pytest\n");
    let runner = ScriptedRunner::new().respond("post", 0, "", "");

    let err = IntentEngine::new(&fs, &runner)
        .sync(&cfg, WriteMode::Adopt)
        .unwrap_err();

    assert!(matches!(err, Error::Ownership { .. }));
    assert!(fs.read(&NormalizedPath::new(".github/workflows/ci.yml")).is_some());
    assert_eq!(
        fs.read(&NormalizedPath::new("justfile")).as_deref(),
        Some("test:\n    pytest\n")
    );
    assert!(runner.calls().is_empty());
}

#[test]
fn test_sync_runs_generate_hooks_after_writes() {
    let cfg = load("[plugins]\ngenerate = [\"fmt\", \"post\"]\n");
    let fs = MemoryFs::new();
    let runner = ScriptedRunner::new()
        .respond("fmt", 1, "", "bad format")
        .respond("post", 0, "", "");

    let report = IntentEngine::new(&fs, &runner)
        .sync(&cfg, WriteMode::Strict)
        .unwrap();

    assert!(!report.ok());
    assert_eq!(runner.calls(), vec!["fmt"]);
    assert_eq!(fs.writes(), 2);
    assert_eq!(
        report.hooks.error().map(|e| e.to_string()).as_deref(),
        Some("generate hook failed: fmt: exited with code 1: bad format")
    );
}

#[test]
fn test_preview_never_writes() {
    let cfg = load("");
    let fs = MemoryFs::new();
    let runner = ScriptedRunner::new();

    let lines = IntentEngine::new(&fs, &runner).preview(&cfg).unwrap();

    assert_eq!(
        lines,
        vec!["Would write .github/workflows/ci.yml", "Would write justfile"]
    );
    assert_eq!(fs.writes(), 0);
}

#[test]
fn test_check_reports_missing_files() {
    let cfg = load("");
    let fs = MemoryFs::new();
    let runner = ScriptedRunner::new();

    let report = IntentEngine::new(&fs, &runner).check(&cfg, false).unwrap();

    assert!(!report.ok);
    assert!(report.has_file_drift());
    assert_eq!(report.versions.code, Code::VersionSkipped);
    let messages: Vec<&str> = report.files.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![".github/workflows/ci.yml is missing", "justfile is missing"]
    );
}

#[test]
fn test_check_clean_project() {
    let cfg = load(
        r#"
[[checks.assertions]]
command = "coverage"
path = "totals.percent"
op = "gte"
value = 80
"#,
    );
    let fs = synced(&cfg).with_file("pyproject.toml", "[project]\nrequires-python = \">=3.12,<3.13\"\n");
    let runner = ScriptedRunner::new().json("cov", r#"{"totals": {"percent": 91}}"#);

    let report = IntentEngine::new(&fs, &runner).check(&cfg, false).unwrap();

    assert!(report.ok, "{report:#?}");
    assert_eq!(report.versions.code, Code::VersionOk);
    assert_eq!(report.checks[0].code, Code::CheckPass);
    assert_eq!(runner.calls_to("cov"), 1);
}

#[test]
fn test_broader_range_is_a_note_unless_strict() {
    let cfg = load("");
    let fs = synced(&cfg).with_file("pyproject.toml", "[project]\nrequires-python = \">=3.11,<3.13\"\n");
    let runner = ScriptedRunner::new();
    let engine = IntentEngine::new(&fs, &runner);

    let lenient = engine.check(&cfg, false).unwrap();
    assert!(lenient.ok);
    assert!(lenient.versions.is_note());
    assert_eq!(lenient.versions.code, Code::VersionBroader);

    let strict = engine.check(&cfg, true).unwrap();
    assert!(!strict.ok);
    assert_eq!(strict.versions.code, Code::VersionBroader);
}

#[test]
fn test_strict_policy_pack_makes_check_strict() {
    let cfg = load("[policy]\npack = \"strict\"\n");
    let fs = synced(&cfg).with_file("pyproject.toml", "[project]\nrequires-python = \">=3.11\"\n");
    let runner = ScriptedRunner::new();

    let report = IntentEngine::new(&fs, &runner).check(&cfg, false).unwrap();
    assert!(!report.versions.ok);
}

#[test]
fn test_failed_check_hook_fails_the_report() {
    let cfg = load("[plugins]\ncheck = [\"lint\", \"types\"]\n");
    let fs = synced(&cfg);
    let runner = ScriptedRunner::new().respond("lint", 2, "", "E501");

    let report = IntentEngine::new(&fs, &runner).check(&cfg, false).unwrap();

    assert!(!report.ok);
    assert_eq!(report.plugins.len(), 1);
    assert_eq!(report.plugins[0].code, Code::HookNonZero);
    assert_eq!(report.plugins[0].exit_code, Some(2));
    assert_eq!(runner.calls_to("types"), 0);
}

#[test]
fn test_summary_reads_baseline_file() {
    let cfg = load(
        r#"
[ci.summary]
enabled = true
title = "Quality"
baseline_file = "baseline.json"

[[ci.summary.metrics]]
label = "Coverage"
command = "coverage"
path = "totals.percent"
baseline_source = "file"
baseline_path = "coverage.percent"
precision = 1
"#,
    );
    let fs = synced(&cfg).with_file("baseline.json", r#"{"coverage": {"percent": 80.0}}"#);
    let runner = ScriptedRunner::new().json("cov", r#"{"totals": {"percent": 82.34}}"#);

    let report = IntentEngine::new(&fs, &runner).check(&cfg, false).unwrap();

    assert!(report.report.summary_enabled);
    let metric = &report.report.metrics[0];
    assert!(metric.ok);
    assert_eq!(metric.baseline, Some(serde_json::json!(80.0)));
    let markdown = report.report.summary_markdown.as_deref().unwrap();
    assert!(markdown.starts_with("## Quality"), "{markdown}");
    assert!(markdown.contains("| Coverage | 82.3 | 80.0 | +2.3 |"), "{markdown}");
}

#[test]
fn test_missing_baseline_file_follows_policy() {
    let cfg = load(
        r#"
[ci.summary]
enabled = true
baseline_file = "baseline.json"
on_missing_baseline = "fail"

[[ci.summary.metrics]]
label = "Coverage"
command = "coverage"
path = "totals.percent"
baseline_source = "file"
baseline_path = "coverage.percent"
"#,
    );
    let fs = synced(&cfg);
    let runner = ScriptedRunner::new().json("cov", r#"{"totals": {"percent": 82}}"#);

    let report = IntentEngine::new(&fs, &runner).check(&cfg, false).unwrap();

    let metric = &report.report.metrics[0];
    assert!(!metric.ok);
    assert_eq!(metric.code, Code::BaselineUnavailable);
    assert!(
        metric
            .reason
            .as_deref()
            .is_some_and(|r| r.contains("baseline file 'baseline.json' not found")),
        "{:?}",
        metric.reason
    );
    assert!(!report.ok);
}

#[test]
fn test_json_payload_round_trips_through_serde() {
    let cfg = load("");
    let fs = synced(&cfg);
    let runner = ScriptedRunner::new();

    let report = IntentEngine::new(&fs, &runner).check(&cfg, false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(value["ok"], serde_json::json!(true));
    assert_eq!(value["files"][1]["code"], serde_json::json!("INTENT200"));
    assert_eq!(value["versions"]["code"], serde_json::json!("INTENT104"));
}
