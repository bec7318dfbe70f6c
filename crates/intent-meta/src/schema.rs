//! Typed configuration produced by the loader.
//!
//! Every value here has already passed validation; consumers never re-check
//! types or references.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::json_path::JsonPath;
use crate::version::VersionTuple;

/// The only supported `[intent].schema_version`.
pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_CI_INSTALL: &str = "-e .[dev]";
pub const DEFAULT_RUNS_ON: &str = "ubuntu-latest";
pub const DEFAULT_SUMMARY_TITLE: &str = "Intent Report";

/// Name of the synthesized workflow job that publishes the check summary.
pub const SUMMARY_JOB_NAME: &str = "intent_summary";

/// Bounded wait applied to check commands and plugin hooks.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// The validated contents of `intent.toml`.
#[derive(Debug, Clone)]
pub struct IntentConfig {
    /// Display path of the file this was loaded from
    pub source: String,
    pub schema_version: u32,
    /// Declared interpreter version, as written (trimmed)
    pub python_version: String,
    pub python: VersionTuple,
    pub commands: CommandTable,
    pub ci: CiConfig,
    pub checks: ChecksConfig,
    pub plugins: PluginsConfig,
    pub policy: Policy,
}

/// Named shell commands in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTable {
    entries: Vec<(String, String)>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command; returns `false` if the name was already present.
    pub fn insert(&mut self, name: impl Into<String>, command: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, command.into()));
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A scalar usable in workflow `env`, `with` and matrix values.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    None,
    Pip,
}

#[derive(Debug, Clone, Default)]
pub struct CiConfig {
    /// Argument to `python -m pip install`
    pub install: String,
    pub cache: CacheMode,
    pub python_versions: Option<Vec<String>>,
    pub triggers: Vec<String>,
    pub jobs: Vec<CiJob>,
    pub artifacts: Vec<CiArtifact>,
    pub summary: Option<SummarySpec>,
}

impl CiConfig {
    pub fn summary_enabled(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| s.enabled)
    }
}

#[derive(Debug, Clone)]
pub struct CiJob {
    pub name: String,
    pub runs_on: String,
    pub needs: Vec<String>,
    pub if_condition: Option<String>,
    pub timeout_minutes: Option<u32>,
    pub continue_on_error: bool,
    /// Matrix axes; keys sort deterministically.
    pub matrix: BTreeMap<String, Vec<Scalar>>,
    pub steps: Vec<CiStep>,
}

impl CiJob {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs_on: DEFAULT_RUNS_ON.to_string(),
            needs: Vec::new(),
            if_condition: None,
            timeout_minutes: None,
            continue_on_error: false,
            matrix: BTreeMap::new(),
            steps: Vec::new(),
        }
    }
}

/// The single action a step performs.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Inline shell script
    Run(String),
    /// Reference to a `[commands]` entry
    Command(String),
    /// External action, e.g. `actions/checkout@v4`
    Uses {
        uses: String,
        with: BTreeMap<String, Scalar>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CiStep {
    pub name: Option<String>,
    pub if_condition: Option<String>,
    pub continue_on_error: bool,
    pub working_directory: Option<String>,
    pub env: BTreeMap<String, Scalar>,
    pub action: StepAction,
}

impl CiStep {
    pub fn new(action: StepAction) -> Self {
        Self {
            name: None,
            if_condition: None,
            continue_on_error: false,
            working_directory: None,
            env: BTreeMap::new(),
            action,
        }
    }

    pub fn run(script: impl Into<String>) -> Self {
        Self::new(StepAction::Run(script.into()))
    }

    pub fn uses(action: impl Into<String>) -> Self {
        Self::new(StepAction::Uses {
            uses: action.into(),
            with: BTreeMap::new(),
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.if_condition = Some(condition.into());
        self
    }

    /// Add a `with` input; ignored unless the step uses an action.
    pub fn with_input(mut self, key: impl Into<String>, value: Scalar) -> Self {
        if let StepAction::Uses { with, .. } = &mut self.action {
            with.insert(key.into(), value);
        }
        self
    }
}

/// When an artifact upload step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactWhen {
    #[default]
    Always,
    OnFailure,
    OnSuccess,
}

impl ArtifactWhen {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "always" => Some(Self::Always),
            "on-failure" => Some(Self::OnFailure),
            "on-success" => Some(Self::OnSuccess),
            _ => None,
        }
    }

    /// The workflow `if:` expression for this condition.
    pub fn expression(&self) -> &'static str {
        match self {
            Self::Always => "${{ always() }}",
            Self::OnFailure => "${{ failure() }}",
            Self::OnSuccess => "${{ success() }}",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CiArtifact {
    pub name: String,
    pub path: String,
    pub retention_days: Option<u32>,
    pub when: ArtifactWhen,
}

/// What to do when a metric's baseline cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaselinePolicy {
    /// Fail the metric
    Fail,
    /// Keep the metric ok, note the gap and omit the delta
    #[default]
    Note,
}

/// Where a metric's baseline value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum BaselineSource {
    /// Another path in the metric command's own payload
    SamePayload { path: JsonPath },
    /// A path in another declared command's payload
    Command { command: String, path: JsonPath },
    /// A path in the summary's `baseline_file`
    File { path: JsonPath },
}

impl BaselineSource {
    pub fn path(&self) -> &JsonPath {
        match self {
            Self::SamePayload { path } | Self::Command { path, .. } | Self::File { path } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub label: String,
    pub command: String,
    pub path: JsonPath,
    pub baseline: Option<BaselineSource>,
    /// Decimal places for display
    pub precision: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummarySpec {
    pub enabled: bool,
    pub title: String,
    pub metrics: Vec<MetricSpec>,
    /// Project-relative JSON file used by `baseline_source = "file"`
    pub baseline_file: Option<String>,
    pub on_missing_baseline: BaselinePolicy,
}

impl Default for SummarySpec {
    fn default() -> Self {
        Self {
            enabled: false,
            title: DEFAULT_SUMMARY_TITLE.to_string(),
            metrics: Vec::new(),
            baseline_file: None,
            on_missing_baseline: BaselinePolicy::default(),
        }
    }
}

/// Assertion operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
}

impl AssertOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "not_in",
        }
    }

    /// Operators that need an ordering between operands.
    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::Gt | Self::Gte | Self::Lt | Self::Lte)
    }

    /// Operators whose expected operand must be an array.
    pub fn is_membership(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl std::fmt::Display for AssertOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckAssertion {
    pub command: String,
    pub path: JsonPath,
    pub op: AssertOp,
    pub expected: Value,
    pub message: Option<String>,
}

/// Gate semantics, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq)]
pub enum GateKind {
    /// Passes iff `min <= value <= max`
    Threshold { max: f64, min: Option<f64> },
    /// Passes iff the value equals `value`
    Equals { value: Value },
}

impl GateKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Threshold { .. } => "threshold",
            Self::Equals { .. } => "equals",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckGate {
    pub name: String,
    pub command: String,
    pub path: JsonPath,
    pub kind: GateKind,
}

#[derive(Debug, Clone)]
pub struct ChecksConfig {
    pub assertions: Vec<CheckAssertion>,
    pub gates: Vec<CheckGate>,
    pub timeout: Duration,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            assertions: Vec::new(),
            gates: Vec::new(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PluginsConfig {
    pub check: Vec<String>,
    pub generate: Vec<String>,
    pub timeout: Duration,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            check: Vec::new(),
            generate: Vec::new(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// Resolved policy: pack defaults with explicit overrides applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub pack: Option<String>,
    pub strict: bool,
    pub workflow_lint_strict: bool,
}

impl IntentConfig {
    /// A minimal config with the given version and commands, for callers
    /// that build configs programmatically.
    pub fn minimal<'a>(
        python_version: &str,
        commands: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> crate::Result<Self> {
        let python = VersionTuple::parse(python_version)?;
        let mut table = CommandTable::new();
        for (name, command) in commands {
            table.insert(name, command);
        }
        Ok(Self {
            source: crate::loader::DEFAULT_SOURCE.to_string(),
            schema_version: SCHEMA_VERSION,
            python_version: python_version.trim().to_string(),
            python,
            commands: table,
            ci: CiConfig {
                install: DEFAULT_CI_INSTALL.to_string(),
                triggers: vec!["push".to_string()],
                ..CiConfig::default()
            },
            checks: ChecksConfig::default(),
            plugins: PluginsConfig::default(),
            policy: Policy::default(),
        })
    }
}
