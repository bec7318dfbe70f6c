use intent_meta::{
    ArtifactWhen, AssertOp, BaselinePolicy, BaselineSource, CacheMode, ConfigLoader, Error,
    GateKind, IntentConfig, OperatorTable, PolicyPackRegistry, Scalar, StepAction,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn load(text: &str) -> Result<IntentConfig, Error> {
    let packs = PolicyPackRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();
    ConfigLoader::new(&packs, &operators).load_str("intent.toml", text)
}

fn load_err(text: &str) -> String {
    load(text).unwrap_err().to_string()
}

const BASE: &str = r#"
[python]
version = "3.12"

[commands]
test = "pytest -q"
lint = "ruff check ."
"#;

fn with_base(extra: &str) -> String {
    format!("{BASE}\n{extra}")
}

#[test]
fn test_minimal_config_uses_defaults() {
    let cfg = load(BASE).unwrap();

    assert_eq!(cfg.python_version, "3.12");
    assert_eq!(cfg.schema_version, 1);
    assert_eq!(
        cfg.commands.iter().collect::<Vec<_>>(),
        vec![("test", "pytest -q"), ("lint", "ruff check .")]
    );
    assert_eq!(cfg.ci.install, "-e .[dev]");
    assert_eq!(cfg.ci.cache, CacheMode::None);
    assert_eq!(cfg.ci.triggers, vec!["push"]);
    assert!(cfg.ci.jobs.is_empty());
    assert!(!cfg.ci.summary_enabled());
    assert!(!cfg.policy.strict);
    assert_eq!(cfg.policy.pack, None);
}

#[test]
fn test_commands_are_trimmed() {
    let cfg = load("[python]\nversion = \" 3.12 \"\n[commands]\ntest = \"  pytest -q  \"\n").unwrap();
    assert_eq!(cfg.python_version, "3.12");
    assert_eq!(cfg.commands.get("test"), Some("pytest -q"));
}

#[rstest]
#[case("[commands]\ntest = \"pytest\"\n", "intent.toml: missing [python] (expected table)")]
#[case(
    "python = \"3.12\"\n[commands]\ntest = \"pytest\"\n",
    "intent.toml: invalid [python] (expected table, got string)"
)]
#[case(
    "[python]\nversion = 3.12\n[commands]\ntest = \"pytest\"\n",
    "intent.toml: invalid [python].version (expected string, got float)"
)]
#[case(
    "[python]\n[commands]\ntest = \"pytest\"\n",
    "intent.toml: missing [python].version (expected string)"
)]
#[case(
    "[python]\nversion = \"3.12\"\n[commands]\ntest = 1\n",
    "intent.toml: invalid [commands].test (expected string shell command, got integer)"
)]
fn test_type_errors_name_field_and_types(#[case] text: &str, #[case] expected: &str) {
    let message = load_err(text);
    assert!(message.starts_with(expected), "{message}");
}

#[test]
fn test_python_commands_key_is_not_the_command_table() {
    // `commands` nested under [python] leaves the real table missing.
    let message = load_err("[python]\nversion = \"3.12\"\ncommands = []\n");
    assert_eq!(message, "intent.toml: missing [commands] (expected table)");
}

#[test]
fn test_invalid_toml_names_file() {
    let message = load_err("[python\nversion = \"3.12\"");
    assert!(message.starts_with("Invalid TOML in intent.toml"), "{message}");
}

#[test]
fn test_empty_commands_rejected() {
    let message = load_err("[python]\nversion = \"3.12\"\n[commands]\n");
    assert!(message.contains("must define at least one command"), "{message}");
}

#[test]
fn test_blank_command_rejected() {
    let message = load_err("[python]\nversion = \"3.12\"\n[commands]\ntest = \"   \"\n");
    assert_eq!(message, "intent.toml: invalid [commands].test (cannot be empty)");
}

#[rstest]
#[case("default", "'default' is reserved for the recipe list")]
#[case("1st", "must start with a letter or '_'")]
#[case("\"unit:fast\"", "must start with a letter or '_'")]
fn test_command_names_must_be_recipe_names(#[case] name: &str, #[case] expected: &str) {
    let message = load_err(&format!(
        "[python]\nversion = \"3.12\"\n[commands]\n{name} = \"pytest\"\n"
    ));
    assert!(message.contains(expected), "{message}");
}

#[test]
fn test_invalid_python_version_rejected() {
    let message = load_err("[python]\nversion = \"3.5l\"\n[commands]\ntest = \"pytest\"\n");
    assert!(message.contains("[python].version"), "{message}");
    assert!(message.contains("'3.5l'"), "{message}");
}

#[rstest]
#[case("[intent]\n", "missing [intent].schema_version (expected integer)")]
#[case("[intent]\nschema_version = \"1\"\n", "invalid [intent].schema_version (expected integer, got string)")]
#[case("[intent]\nschema_version = 2\n", "unsupported [intent].schema_version=2 (expected 1)")]
fn test_schema_version_rules(#[case] extra: &str, #[case] expected: &str) {
    let message = load_err(&with_base(extra));
    assert!(message.contains(expected), "{message}");
}

#[test]
fn test_schema_version_one_accepted() {
    let cfg = load(&with_base("[intent]\nschema_version = 1\n")).unwrap();
    assert_eq!(cfg.schema_version, 1);
}

#[rstest]
#[case("", None, false, false)]
#[case("[policy]\nstrict = true\n", None, true, false)]
#[case("[policy]\npack = \"strict\"\n", Some("strict"), true, true)]
#[case("[policy]\npack = \"ci-gate\"\n", Some("ci-gate"), true, false)]
#[case("[policy]\npack = \"strict\"\nstrict = false\n", Some("strict"), false, true)]
#[case("[policy]\npack = \"default\"\nworkflow_lint_strict = true\n", Some("default"), false, true)]
fn test_policy_pack_expansion(
    #[case] extra: &str,
    #[case] pack: Option<&str>,
    #[case] strict: bool,
    #[case] lint_strict: bool,
) {
    let cfg = load(&with_base(extra)).unwrap();
    assert_eq!(cfg.policy.pack.as_deref(), pack);
    assert_eq!(cfg.policy.strict, strict);
    assert_eq!(cfg.policy.workflow_lint_strict, lint_strict);
}

#[test]
fn test_policy_errors() {
    let message = load_err(&with_base("[policy]\nstrict = \"yes\"\n"));
    assert_eq!(
        message,
        "intent.toml: invalid [policy].strict (expected boolean, got string)"
    );

    let message = load_err(&with_base("[policy]\npack = \"lenient\"\n"));
    assert!(message.contains("unknown pack 'lenient'"), "{message}");
    assert!(message.contains("ci-gate, default, strict"), "{message}");
}

#[test]
fn test_ci_section() {
    let cfg = load(&with_base(
        r#"
[ci]
install = " -e . "
cache = "PIP"
python_versions = ["3.11", "3.12"]
triggers = ["push", "pull_request"]
"#,
    ))
    .unwrap();

    assert_eq!(cfg.ci.install, "-e .");
    assert_eq!(cfg.ci.cache, CacheMode::Pip);
    assert_eq!(cfg.ci.python_versions, Some(vec!["3.11".into(), "3.12".into()]));
    assert_eq!(cfg.ci.triggers, vec!["push", "pull_request"]);
}

#[rstest]
#[case("[ci]\ncache = \"conda\"\n", "expected one of 'none', 'pip', got 'conda'")]
#[case("[ci]\npython_versions = []\n", "[ci].python_versions (must be a non-empty array of strings)")]
#[case("[ci]\npython_versions = [\"3.x\"]\n", "[ci].python_versions[0]")]
#[case("[ci]\ntriggers = [\"push\", \"\"]\n", "[ci].triggers[1] (expected non-empty string)")]
#[case("[ci]\ninstall = \"\"\n", "[ci].install (cannot be empty)")]
fn test_ci_errors(#[case] extra: &str, #[case] expected: &str) {
    let message = load_err(&with_base(extra));
    assert!(message.contains(expected), "{message}");
}

#[test]
fn test_custom_jobs_and_steps() {
    let cfg = load(&with_base(
        r#"
[[ci.jobs]]
name = "lint"
steps = [
  { uses = "actions/checkout@v4" },
  { command = "lint", if = "${{ github.event_name == 'push' }}" },
]

[[ci.jobs]]
name = "test"
needs = ["lint"]
timeout_minutes = 15
continue_on_error = true
matrix = { python-version = ["3.11", "3.12"] }
steps = [
  { uses = "actions/setup-python@v5", with = { python-version = "${{ matrix.python-version }}" } },
  { command = "test", working_directory = ".", env = { PYTHONUNBUFFERED = "1" }, continue_on_error = true },
  { run = "echo done", name = "Done" },
]
"#,
    ))
    .unwrap();

    let jobs = &cfg.ci.jobs;
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].name, "lint");
    assert_eq!(jobs[0].runs_on, "ubuntu-latest");
    assert_eq!(
        jobs[0].steps[1].if_condition.as_deref(),
        Some("${{ github.event_name == 'push' }}")
    );

    let test = &jobs[1];
    assert_eq!(test.needs, vec!["lint"]);
    assert_eq!(test.timeout_minutes, Some(15));
    assert!(test.continue_on_error);
    assert_eq!(
        test.matrix["python-version"],
        vec![Scalar::String("3.11".into()), Scalar::String("3.12".into())]
    );
    match &test.steps[0].action {
        StepAction::Uses { uses, with } => {
            assert_eq!(uses, "actions/setup-python@v5");
            assert_eq!(
                with["python-version"],
                Scalar::String("${{ matrix.python-version }}".into())
            );
        }
        other => panic!("unexpected action {other:?}"),
    }
    assert_eq!(test.steps[1].action, StepAction::Command("test".into()));
    assert_eq!(test.steps[1].env["PYTHONUNBUFFERED"], Scalar::String("1".into()));
    assert_eq!(test.steps[2].action, StepAction::Run("echo done".into()));
    assert_eq!(test.steps[2].name.as_deref(), Some("Done"));
}

#[rstest]
#[case(
    "[[ci.jobs]]\nname = \"a\"\nsteps = [{}]\n",
    "[ci.jobs][0].steps[0] (expected exactly one of run, command or uses)"
)]
#[case(
    "[[ci.jobs]]\nname = \"a\"\nsteps = [{ run = \"x\", uses = \"y@v1\" }]\n",
    "got run, uses"
)]
#[case(
    "[[ci.jobs]]\nname = \"a\"\nsteps = [{ run = \"x\", with = { a = 1 } }]\n",
    "[ci.jobs][0].steps[0].with (only valid on steps that use an action)"
)]
#[case(
    "[[ci.jobs]]\nname = \"a\"\nsteps = [{ command = \"deploy\" }]\n",
    "[ci.jobs][0].steps[0].command references unknown command 'deploy'"
)]
#[case("[[ci.jobs]]\nname = \"a\"\nsteps = []\n", "must contain at least one step")]
#[case("[[ci.jobs]]\nname = \"a\"\n", "missing [ci.jobs][0].steps")]
#[case(
    "[[ci.jobs]]\nname = \"a\"\nsteps = [{ run = \"x\" }]\n[[ci.jobs]]\nname = \"a\"\nsteps = [{ run = \"y\" }]\n",
    "duplicate [ci.jobs].name 'a'"
)]
#[case(
    "[[ci.jobs]]\nname = \"a\"\nneeds = [\"ghost\"]\nsteps = [{ run = \"x\" }]\n",
    "[ci.jobs][0].needs references unknown job 'ghost'"
)]
#[case(
    "[[ci.jobs]]\nname = \"bad name\"\nsteps = [{ run = \"x\" }]\n",
    "must start with a letter or '_'"
)]
#[case(
    "[[ci.jobs]]\nname = \"intent_summary\"\nsteps = [{ run = \"x\" }]\n",
    "'intent_summary' is reserved for the summary job"
)]
#[case(
    "[[ci.jobs]]\nname = \"a\"\nmatrix = { py = [] }\nsteps = [{ run = \"x\" }]\n",
    "[ci.jobs][0].matrix.py (must list at least one value)"
)]
#[case(
    "[[ci.jobs]]\nname = \"a\"\ntimeout_minutes = 0\nsteps = [{ run = \"x\" }]\n",
    "expected a positive integer, got 0"
)]
fn test_job_errors(#[case] extra: &str, #[case] expected: &str) {
    let message = load_err(&with_base(extra));
    assert!(message.contains(expected), "{message}");
}

#[test]
fn test_needs_cycle_rejected() {
    let message = load_err(&with_base(
        r#"
[[ci.jobs]]
name = "a"
needs = ["c"]
steps = [{ run = "x" }]

[[ci.jobs]]
name = "b"
needs = ["a"]
steps = [{ run = "x" }]

[[ci.jobs]]
name = "c"
needs = ["b"]
steps = [{ run = "x" }]
"#,
    ));
    assert_eq!(
        message,
        "intent.toml: [ci.jobs] needs form a cycle: a -> c -> b -> a"
    );
}

#[test]
fn test_self_need_is_a_cycle() {
    let message = load_err(&with_base(
        "[[ci.jobs]]\nname = \"a\"\nneeds = [\"a\"]\nsteps = [{ run = \"x\" }]\n",
    ));
    assert!(message.ends_with("a -> a"), "{message}");
}

#[test]
fn test_diamond_needs_is_not_a_cycle() {
    let cfg = load(&with_base(
        r#"
[[ci.jobs]]
name = "base"
steps = [{ run = "x" }]
[[ci.jobs]]
name = "left"
needs = ["base"]
steps = [{ run = "x" }]
[[ci.jobs]]
name = "right"
needs = ["base"]
steps = [{ run = "x" }]
[[ci.jobs]]
name = "top"
needs = ["left", "right"]
steps = [{ run = "x" }]
"#,
    ))
    .unwrap();
    assert_eq!(cfg.ci.jobs.len(), 4);
}

#[test]
fn test_artifacts() {
    let cfg = load(&with_base(
        r#"
[[ci.artifacts]]
name = "junit"
path = "reports/junit.xml"
retention_days = 7
when = "on-failure"

[[ci.artifacts]]
name = "coverage"
path = "coverage.xml"
"#,
    ))
    .unwrap();

    assert_eq!(cfg.ci.artifacts.len(), 2);
    assert_eq!(cfg.ci.artifacts[0].retention_days, Some(7));
    assert_eq!(cfg.ci.artifacts[0].when, ArtifactWhen::OnFailure);
    assert_eq!(cfg.ci.artifacts[1].when, ArtifactWhen::Always);

    let message = load_err(&with_base(
        "[[ci.artifacts]]\nname = \"x\"\npath = \"y\"\nwhen = \"sometimes\"\n",
    ));
    assert!(
        message.contains("expected one of 'always', 'on-failure', 'on-success', got 'sometimes'"),
        "{message}"
    );
}

#[test]
fn test_summary_metrics_and_baselines() {
    let cfg = load(
        r#"
[python]
version = "3.12"

[commands]
cov = "coverage json -o -"
cov_main = "cat main.json"

[ci.summary]
title = "Quality"
baseline_file = "baseline.json"
on_missing_baseline = "fail"

[[ci.summary.metrics]]
label = "Coverage"
command = "cov"
path = "totals.percent"
precision = 2

[[ci.summary.metrics]]
label = "Coverage vs previous"
command = "cov"
path = "totals.percent"
baseline_path = "previous.percent"

[[ci.summary.metrics]]
label = "Coverage vs main"
command = "cov"
path = "totals.percent"
baseline_command = "cov_main"

[[ci.summary.metrics]]
label = "Coverage vs file"
command = "cov"
path = "totals.percent"
baseline_source = "file"
baseline_path = "coverage"
"#,
    )
    .unwrap();

    let summary = cfg.ci.summary.as_ref().unwrap();
    assert!(summary.enabled);
    assert_eq!(summary.title, "Quality");
    assert_eq!(summary.on_missing_baseline, BaselinePolicy::Fail);
    assert_eq!(summary.metrics.len(), 4);
    assert_eq!(summary.metrics[0].precision, Some(2));
    assert!(summary.metrics[0].baseline.is_none());
    assert!(matches!(
        &summary.metrics[1].baseline,
        Some(BaselineSource::SamePayload { path }) if path.as_str() == "previous.percent"
    ));
    assert!(matches!(
        &summary.metrics[2].baseline,
        Some(BaselineSource::Command { command, path })
            if command == "cov_main" && path.as_str() == "totals.percent"
    ));
    assert!(matches!(
        &summary.metrics[3].baseline,
        Some(BaselineSource::File { path }) if path.as_str() == "coverage"
    ));
}

#[rstest]
#[case(
    "[[ci.summary.metrics]]\nlabel = \"x\"\ncommand = \"nope\"\npath = \"a\"\n",
    "[ci.summary.metrics][0].command references unknown command 'nope'"
)]
#[case(
    "[[ci.summary.metrics]]\nlabel = \"x\"\ncommand = \"test\"\npath = \"a..b\"\n",
    "[ci.summary.metrics][0].path (invalid path segment '' in 'a..b')"
)]
#[case(
    "[[ci.summary.metrics]]\nlabel = \"x\"\ncommand = \"test\"\npath = \"a\"\nbaseline_source = \"file\"\n",
    "'file' requires [ci.summary].baseline_file"
)]
#[case(
    "[[ci.summary.metrics]]\nlabel = \"x\"\ncommand = \"test\"\npath = \"a\"\nprecision = 11\n",
    "expected 0..=10, got 11"
)]
fn test_metric_errors(#[case] extra: &str, #[case] expected: &str) {
    let message = load_err(&with_base(&format!("[ci.summary]\n{extra}")));
    assert!(message.contains(expected), "{message}");
}

#[test]
fn test_summary_can_be_disabled() {
    let cfg = load(&with_base("[ci.summary]\nenabled = false\n")).unwrap();
    assert!(!cfg.ci.summary_enabled());
}

#[test]
fn test_assertions_and_gates() {
    let cfg = load(&with_base(
        r#"
[checks]
timeout_seconds = 30

[[checks.assertions]]
command = "test"
path = "summary.failed"
op = "eq"
value = 0
message = "no failures"

[[checks.assertions]]
command = "test"
path = "status"
op = "in"
value = ["ok", "skipped"]

[[checks.gates]]
name = "coverage-floor"
kind = "threshold"
command = "test"
path = "coverage"
max = 100
min = 80.5

[[checks.gates]]
name = "status"
kind = "equals"
command = "lint"
path = "result"
value = "clean"
"#,
    ))
    .unwrap();

    assert_eq!(cfg.checks.timeout.as_secs(), 30);
    let first = &cfg.checks.assertions[0];
    assert_eq!(first.op, AssertOp::Eq);
    assert_eq!(first.expected, json!(0));
    assert_eq!(first.message.as_deref(), Some("no failures"));
    assert_eq!(cfg.checks.assertions[1].expected, json!(["ok", "skipped"]));

    assert_eq!(
        cfg.checks.gates[0].kind,
        GateKind::Threshold {
            max: 100.0,
            min: Some(80.5)
        }
    );
    assert_eq!(
        cfg.checks.gates[1].kind,
        GateKind::Equals {
            value: json!("clean")
        }
    );
}

#[rstest]
#[case(
    "[[checks.assertions]]\ncommand = \"test\"\npath = \"a\"\nop = \"~=\"\nvalue = 1\n",
    "unknown operator '~=', expected one of eq, gt, gte, in, lt, lte, ne, not_in"
)]
#[case(
    "[[checks.assertions]]\ncommand = \"test\"\npath = \"a\"\nop = \"in\"\nvalue = 1\n",
    "invalid [checks.assertions][0].value (expected array, got integer)"
)]
#[case(
    "[[checks.assertions]]\ncommand = \"ghost\"\npath = \"a\"\nop = \"eq\"\nvalue = 1\n",
    "[checks.assertions][0].command references unknown command 'ghost'"
)]
#[case(
    "[[checks.assertions]]\ncommand = \"test\"\npath = \"a\"\nop = \"eq\"\n",
    "missing [checks.assertions][0].value"
)]
#[case(
    "[[checks.gates]]\nname = \"g\"\nkind = \"range\"\ncommand = \"test\"\npath = \"a\"\n",
    "expected one of 'threshold', 'equals', got 'range'"
)]
#[case(
    "[[checks.gates]]\nname = \"g\"\nkind = \"threshold\"\ncommand = \"test\"\npath = \"a\"\n",
    "missing [checks.gates][0].max (expected number)"
)]
#[case(
    "[[checks.gates]]\nname = \"g\"\nkind = \"threshold\"\ncommand = \"test\"\npath = \"a\"\nmax = 1\nmin = 2\n",
    "min 2 is greater than max 1"
)]
#[case(
    "[[checks.gates]]\nname = \"g\"\nkind = \"threshold\"\ncommand = \"test\"\npath = \"a\"\nmax = \"0\"\n",
    "invalid [checks.gates][0].max (expected number, got string)"
)]
fn test_check_errors(#[case] extra: &str, #[case] expected: &str) {
    let message = load_err(&with_base(extra));
    assert!(message.contains(expected), "{message}");
}

#[test]
fn test_plugins() {
    let cfg = load(&with_base(
        "[plugins]\ncheck = [\" ./check.sh \"]\ngenerate = [\"./gen.sh\"]\ntimeout_seconds = 5\n",
    ))
    .unwrap();
    assert_eq!(cfg.plugins.check, vec!["./check.sh"]);
    assert_eq!(cfg.plugins.generate, vec!["./gen.sh"]);
    assert_eq!(cfg.plugins.timeout.as_secs(), 5);

    let message = load_err(&with_base("[plugins]\ncheck = \"./check.sh\"\n"));
    assert_eq!(
        message,
        "intent.toml: invalid [plugins].check (expected array of strings, got string)"
    );
    let message = load_err(&with_base("[plugins]\ngenerate = [\"\"]\n"));
    assert_eq!(
        message,
        "intent.toml: invalid [plugins].generate[0] (expected non-empty string)"
    );
}

#[test]
fn test_first_violation_wins() {
    // Both the cache and the job are invalid; [ci].cache is validated first.
    let message = load_err(&with_base(
        "[ci]\ncache = \"conda\"\n[[ci.jobs]]\nname = \"a\"\nsteps = []\n",
    ));
    assert!(message.contains("[ci].cache"), "{message}");
}

#[test]
fn test_load_reports_missing_file() {
    let temp = tempfile::TempDir::new().unwrap();
    let fs = intent_fs::LocalFs::new(temp.path());
    let packs = PolicyPackRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();

    let err = ConfigLoader::new(&packs, &operators)
        .load(&fs, &"intent.toml".into())
        .unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound { .. }));
    assert_eq!(err.to_string(), "intent.toml does not exist");
}
