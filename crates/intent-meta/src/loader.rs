//! Loader and validator for `intent.toml`.
//!
//! Validation is a single fail-fast pass over the parsed document: the
//! first type, value or reference violation aborts with an error naming the
//! source file, the field path, and the expected and actual types.
//!
//! ```text
//! [python]      version = "3.12"
//! [commands]    test = "pytest -q"
//! [ci]          install, cache, python_versions, triggers, jobs, artifacts, summary
//! [checks]      assertions, gates, timeout_seconds
//! [plugins]     check, generate, timeout_seconds
//! [policy]      pack, strict, workflow_lint_strict
//! [intent]      schema_version = 1
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;
use std::time::Duration;

use intent_fs::{Filesystem, NormalizedPath};
use regex::Regex;
use toml::{Table, Value};
use tracing::{debug, warn};

use crate::json_path::JsonPath;
use crate::registry::{OperatorTable, PolicyPackRegistry};
use crate::schema::{
    ArtifactWhen, BaselinePolicy, BaselineSource, CacheMode, CheckAssertion, CheckGate,
    ChecksConfig, CiArtifact, CiConfig, CiJob, CiStep, CommandTable, DEFAULT_CI_INSTALL,
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_RUNS_ON, DEFAULT_SUMMARY_TITLE, GateKind, IntentConfig,
    MetricSpec, PluginsConfig, Policy, SCHEMA_VERSION, SUMMARY_JOB_NAME, Scalar, StepAction,
    SummarySpec,
};
use crate::version::VersionTuple;
use crate::{Error, Result};

/// Conventional config file name.
pub const DEFAULT_SOURCE: &str = "intent.toml";

const KNOWN_SECTIONS: &[&str] = &[
    "intent", "python", "commands", "ci", "checks", "plugins", "policy",
];

const MAX_PRECISION: i64 = 10;

const IDENTIFIER_RULE: &str = "must start with a letter or '_' and contain only letters, digits, '_' and '-'";

/// Recipe name the justfile reserves for `just --list`.
const RESERVED_RECIPE: &str = "default";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").unwrap());

/// Validates raw documents into [`IntentConfig`] values.
///
/// Holds references to the startup lookup tables; it carries no state of
/// its own between loads.
pub struct ConfigLoader<'a> {
    packs: &'a PolicyPackRegistry,
    operators: &'a OperatorTable,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(packs: &'a PolicyPackRegistry, operators: &'a OperatorTable) -> Self {
        Self { packs, operators }
    }

    /// Read and validate a config file through the filesystem collaborator.
    pub fn load(&self, fs: &dyn Filesystem, path: &NormalizedPath) -> Result<IntentConfig> {
        let text = fs
            .read_optional(path)?
            .ok_or_else(|| Error::ConfigNotFound {
                path: path.to_native(),
            })?;
        self.load_str(path.as_str(), &text)
    }

    /// Parse and validate config text; `source` is used in messages.
    pub fn load_str(&self, source: &str, text: &str) -> Result<IntentConfig> {
        let doc: Table = toml::from_str(text).map_err(|e| Error::InvalidToml {
            path: source.to_string(),
            message: e.message().trim().to_string(),
        })?;
        self.from_table(source, &doc)
    }

    /// Validate an already-parsed document.
    pub fn from_table(&self, source: &str, doc: &Table) -> Result<IntentConfig> {
        let v = Validator { source };

        for key in doc.keys() {
            if !KNOWN_SECTIONS.contains(&key.as_str()) {
                warn!(source, section = %key, "ignoring unknown section");
            }
        }

        let (python_version, python) = v.python(doc)?;
        let commands = v.commands(doc)?;
        let schema_version = v.schema_version(doc)?;
        let policy = v.policy(doc, self.packs)?;
        let ci = v.ci(doc, &commands)?;
        let checks = v.checks(doc, &commands, self.operators)?;
        let plugins = v.plugins(doc)?;

        debug!(
            source,
            commands = commands.len(),
            jobs = ci.jobs.len(),
            assertions = checks.assertions.len(),
            gates = checks.gates.len(),
            "config loaded"
        );

        Ok(IntentConfig {
            source: source.to_string(),
            schema_version,
            python_version,
            python,
            commands,
            ci,
            checks,
            plugins,
            policy,
        })
    }
}

/// Convert a TOML value into the closed JSON variant.
///
/// Datetimes become strings; non-finite floats become `null`.
pub fn toml_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Datetime(d) => serde_json::Value::String(d.to_string()),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(toml_to_json).collect()),
        Value::Table(table) => serde_json::Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}

fn field(prefix: &str, key: &str) -> String {
    format!("{prefix}.{key}")
}

struct Validator<'s> {
    source: &'s str,
}

impl Validator<'_> {
    fn invalid(&self, field: impl Into<String>, expected: &str, actual: &Value) -> Error {
        Error::InvalidField {
            path: self.source.to_string(),
            field: field.into(),
            expected: expected.to_string(),
            actual: actual.type_str().to_string(),
        }
    }

    fn missing(&self, field: impl Into<String>, expected: &str) -> Error {
        Error::MissingField {
            path: self.source.to_string(),
            field: field.into(),
            expected: expected.to_string(),
        }
    }

    fn bad_value(&self, field: impl Into<String>, message: impl Into<String>) -> Error {
        Error::InvalidValue {
            path: self.source.to_string(),
            field: field.into(),
            message: message.into(),
        }
    }

    fn unknown(&self, field: impl Into<String>, kind: &'static str, name: &str) -> Error {
        Error::UnknownReference {
            path: self.source.to_string(),
            field: field.into(),
            kind,
            name: name.to_string(),
        }
    }

    fn duplicate(&self, field: impl Into<String>, name: &str) -> Error {
        Error::Duplicate {
            path: self.source.to_string(),
            field: field.into(),
            name: name.to_string(),
        }
    }

    fn required<'v>(
        &self,
        table: &'v Table,
        prefix: &str,
        key: &str,
        expected: &str,
    ) -> Result<&'v Value> {
        table
            .get(key)
            .ok_or_else(|| self.missing(field(prefix, key), expected))
    }

    fn table<'v>(&self, value: &'v Value, field: &str) -> Result<&'v Table> {
        value
            .as_table()
            .ok_or_else(|| self.invalid(field, "table", value))
    }

    fn array<'v>(&self, value: &'v Value, field: &str, expected: &str) -> Result<&'v [Value]> {
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.invalid(field, expected, value))
    }

    fn string<'v>(&self, value: &'v Value, field: &str, expected: &str) -> Result<&'v str> {
        value
            .as_str()
            .ok_or_else(|| self.invalid(field, expected, value))
    }

    /// A string that is non-empty after trimming; returned trimmed.
    fn text(&self, value: &Value, field: &str) -> Result<String> {
        let raw = self.string(value, field, "non-empty string")?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(self.bad_value(field, "cannot be empty"));
        }
        Ok(trimmed.to_string())
    }

    fn opt_text(&self, table: &Table, prefix: &str, key: &str) -> Result<Option<String>> {
        table
            .get(key)
            .map(|value| self.text(value, &field(prefix, key)))
            .transpose()
    }

    fn boolean(&self, value: &Value, field: &str) -> Result<bool> {
        value
            .as_bool()
            .ok_or_else(|| self.invalid(field, "boolean", value))
    }

    fn opt_bool(&self, table: &Table, prefix: &str, key: &str) -> Result<Option<bool>> {
        table
            .get(key)
            .map(|value| self.boolean(value, &field(prefix, key)))
            .transpose()
    }

    fn positive(&self, value: &Value, field: &str) -> Result<u32> {
        let n = value
            .as_integer()
            .ok_or_else(|| self.invalid(field, "positive integer", value))?;
        u32::try_from(n)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| self.bad_value(field, format!("expected a positive integer, got {n}")))
    }

    fn opt_positive(&self, table: &Table, prefix: &str, key: &str) -> Result<Option<u32>> {
        table
            .get(key)
            .map(|value| self.positive(value, &field(prefix, key)))
            .transpose()
    }

    fn number(&self, value: &Value, field: &str) -> Result<f64> {
        match value {
            Value::Integer(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            other => Err(self.invalid(field, "number", other)),
        }
    }

    fn scalar(&self, value: &Value, field: &str) -> Result<Scalar> {
        match value {
            Value::String(s) => Ok(Scalar::String(s.clone())),
            Value::Integer(i) => Ok(Scalar::Integer(*i)),
            Value::Float(f) => Ok(Scalar::Float(*f)),
            Value::Boolean(b) => Ok(Scalar::Bool(*b)),
            other => Err(self.invalid(field, "string, number or boolean", other)),
        }
    }

    fn scalar_map(&self, value: &Value, field: &str) -> Result<BTreeMap<String, Scalar>> {
        self.table(value, field)?
            .iter()
            .map(|(k, v)| Ok((k.clone(), self.scalar(v, &format!("{field}.{k}"))?)))
            .collect()
    }

    fn string_list(&self, value: &Value, field: &str) -> Result<Vec<String>> {
        self.array(value, field, "array of strings")?
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let item_field = format!("{field}[{idx}]");
                match item.as_str().map(str::trim) {
                    Some(s) if !s.is_empty() => Ok(s.to_string()),
                    Some(_) => Err(self.bad_value(item_field, "expected non-empty string")),
                    None => Err(self.invalid(item_field, "non-empty string", item)),
                }
            })
            .collect()
    }

    fn non_empty_list(&self, value: &Value, field: &str) -> Result<Vec<String>> {
        let items = self.string_list(value, field)?;
        if items.is_empty() {
            return Err(self.bad_value(field, "must be a non-empty array of strings"));
        }
        Ok(items)
    }

    fn timeout(&self, table: &Table, prefix: &str) -> Result<Duration> {
        Ok(self
            .opt_positive(table, prefix, "timeout_seconds")?
            .map(|secs| Duration::from_secs(u64::from(secs)))
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT))
    }

    fn json_path(&self, value: &Value, field: &str) -> Result<JsonPath> {
        let raw = self.string(value, field, "string path")?;
        JsonPath::parse(raw).map_err(|reason| self.bad_value(field, reason))
    }

    fn declared_command(
        &self,
        value: &Value,
        field: &str,
        commands: &CommandTable,
    ) -> Result<String> {
        let name = self.text(value, field)?;
        if !commands.contains(&name) {
            return Err(self.unknown(field, "command", &name));
        }
        Ok(name)
    }

    fn section<'v>(&self, doc: &'v Table, name: &str) -> Result<Option<&'v Table>> {
        doc.get(name)
            .map(|value| self.table(value, &format!("[{name}]")))
            .transpose()
    }

    // --- sections -------------------------------------------------------

    fn python(&self, doc: &Table) -> Result<(String, VersionTuple)> {
        let section = doc
            .get("python")
            .ok_or_else(|| self.missing("[python]", "table"))?;
        let section = self.table(section, "[python]")?;
        let raw = self.required(section, "[python]", "version", "string")?;
        let text = self.string(raw, "[python].version", "string")?.trim();
        let tuple = VersionTuple::parse(text).map_err(|_| {
            self.bad_value(
                "[python].version",
                format!("'{text}' is not a version like '3.12'"),
            )
        })?;
        Ok((text.to_string(), tuple))
    }

    fn commands(&self, doc: &Table) -> Result<CommandTable> {
        let section = doc
            .get("commands")
            .ok_or_else(|| self.missing("[commands]", "table"))?;
        let section = self.table(section, "[commands]")?;
        if section.is_empty() {
            return Err(self.bad_value("[commands]", "must define at least one command"));
        }

        let mut commands = CommandTable::new();
        for (name, value) in section {
            let field = format!("[commands].{name}");
            if !IDENTIFIER.is_match(name) {
                return Err(self.bad_value(&field, IDENTIFIER_RULE));
            }
            if name == RESERVED_RECIPE {
                return Err(self.bad_value(
                    &field,
                    format!("'{RESERVED_RECIPE}' is reserved for the recipe list"),
                ));
            }
            let command = self.string(value, &field, "string shell command")?;
            if command.trim().is_empty() {
                return Err(self.bad_value(&field, "cannot be empty"));
            }
            commands.insert(name.as_str(), command.trim());
        }
        Ok(commands)
    }

    fn schema_version(&self, doc: &Table) -> Result<u32> {
        let Some(section) = self.section(doc, "intent")? else {
            return Ok(SCHEMA_VERSION);
        };
        let raw = section
            .get("schema_version")
            .ok_or_else(|| self.missing("[intent].schema_version", "integer"))?;
        let found = raw
            .as_integer()
            .ok_or_else(|| self.invalid("[intent].schema_version", "integer", raw))?;
        if found != i64::from(SCHEMA_VERSION) {
            return Err(Error::UnsupportedSchema {
                path: self.source.to_string(),
                found,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(SCHEMA_VERSION)
    }

    fn policy(&self, doc: &Table, packs: &PolicyPackRegistry) -> Result<Policy> {
        let fallback = packs.fallback();
        let mut policy = Policy {
            pack: None,
            strict: fallback.strict,
            workflow_lint_strict: fallback.workflow_lint_strict,
        };
        let Some(section) = self.section(doc, "policy")? else {
            return Ok(policy);
        };

        if let Some(name) = self.opt_text(section, "[policy]", "pack")? {
            let defaults = packs.get(&name).ok_or_else(|| {
                self.bad_value(
                    "[policy].pack",
                    format!(
                        "unknown pack '{name}', expected one of {}",
                        packs.list_known().join(", ")
                    ),
                )
            })?;
            policy.strict = defaults.strict;
            policy.workflow_lint_strict = defaults.workflow_lint_strict;
            policy.pack = Some(name);
        }
        if let Some(strict) = self.opt_bool(section, "[policy]", "strict")? {
            policy.strict = strict;
        }
        if let Some(lint) = self.opt_bool(section, "[policy]", "workflow_lint_strict")? {
            policy.workflow_lint_strict = lint;
        }
        Ok(policy)
    }

    fn ci(&self, doc: &Table, commands: &CommandTable) -> Result<CiConfig> {
        let mut ci = CiConfig {
            install: DEFAULT_CI_INSTALL.to_string(),
            triggers: vec!["push".to_string()],
            ..CiConfig::default()
        };
        let Some(section) = self.section(doc, "ci")? else {
            return Ok(ci);
        };

        if let Some(install) = self.opt_text(section, "[ci]", "install")? {
            ci.install = install;
        }
        if let Some(raw) = section.get("cache") {
            let cache = self.string(raw, "[ci].cache", "string ('none'|'pip')")?;
            ci.cache = match cache.trim().to_ascii_lowercase().as_str() {
                "none" => CacheMode::None,
                "pip" => CacheMode::Pip,
                _ => {
                    return Err(self.bad_value(
                        "[ci].cache",
                        format!("expected one of 'none', 'pip', got '{cache}'"),
                    ));
                }
            };
        }
        if let Some(raw) = section.get("python_versions") {
            let versions = self.non_empty_list(raw, "[ci].python_versions")?;
            for (idx, version) in versions.iter().enumerate() {
                if VersionTuple::parse(version).is_err() {
                    return Err(self.bad_value(
                        format!("[ci].python_versions[{idx}]"),
                        format!("'{version}' is not a version like '3.12'"),
                    ));
                }
            }
            ci.python_versions = Some(versions);
        }
        if let Some(raw) = section.get("triggers") {
            ci.triggers = self.non_empty_list(raw, "[ci].triggers")?;
        }
        if let Some(raw) = section.get("jobs") {
            ci.jobs = self.jobs(raw, commands)?;
        }
        if let Some(raw) = section.get("artifacts") {
            ci.artifacts = self.artifacts(raw)?;
        }
        if let Some(raw) = section.get("summary") {
            ci.summary = Some(self.summary(raw, commands)?);
        }
        Ok(ci)
    }

    fn jobs(&self, value: &Value, commands: &CommandTable) -> Result<Vec<CiJob>> {
        let items = self.array(value, "[ci.jobs]", "array of tables")?;
        let mut jobs = Vec::with_capacity(items.len());
        let mut seen = HashSet::new();

        for (idx, item) in items.iter().enumerate() {
            let prefix = format!("[ci.jobs][{idx}]");
            let job = self.job(item, &prefix, commands)?;
            if !seen.insert(job.name.clone()) {
                return Err(self.duplicate("[ci.jobs].name", &job.name));
            }
            jobs.push(job);
        }

        for (idx, job) in jobs.iter().enumerate() {
            if let Some(missing) = job.needs.iter().find(|n| !seen.contains(n.as_str())) {
                return Err(self.unknown(format!("[ci.jobs][{idx}].needs"), "job", missing));
            }
        }
        if let Some(cycle) = find_needs_cycle(&jobs) {
            return Err(Error::NeedsCycle {
                path: self.source.to_string(),
                cycle: cycle.join(" -> "),
            });
        }
        Ok(jobs)
    }

    fn job(&self, value: &Value, prefix: &str, commands: &CommandTable) -> Result<CiJob> {
        let table = self.table(value, prefix)?;
        let name_field = field(prefix, "name");
        let name = self.text(
            self.required(table, prefix, "name", "non-empty string")?,
            &name_field,
        )?;
        if !IDENTIFIER.is_match(&name) {
            return Err(self.bad_value(name_field, IDENTIFIER_RULE));
        }
        if name == SUMMARY_JOB_NAME {
            return Err(self.bad_value(
                name_field,
                format!("'{SUMMARY_JOB_NAME}' is reserved for the summary job"),
            ));
        }

        let mut job = CiJob::new(name);
        job.runs_on = self
            .opt_text(table, prefix, "runs_on")?
            .unwrap_or_else(|| DEFAULT_RUNS_ON.to_string());
        if let Some(raw) = table.get("needs") {
            let needs_field = field(prefix, "needs");
            let needs = self.string_list(raw, &needs_field)?;
            let mut unique = HashSet::new();
            if let Some(dup) = needs.iter().find(|n| !unique.insert(n.as_str())) {
                return Err(self.duplicate(needs_field, dup));
            }
            job.needs = needs;
        }
        job.if_condition = self.opt_text(table, prefix, "if")?;
        job.timeout_minutes = self.opt_positive(table, prefix, "timeout_minutes")?;
        job.continue_on_error = self
            .opt_bool(table, prefix, "continue_on_error")?
            .unwrap_or(false);
        if let Some(raw) = table.get("matrix") {
            job.matrix = self.matrix(raw, &field(prefix, "matrix"))?;
        }

        let steps_field = field(prefix, "steps");
        let steps = self.array(
            self.required(table, prefix, "steps", "array of tables")?,
            &steps_field,
            "array of tables",
        )?;
        if steps.is_empty() {
            return Err(self.bad_value(steps_field, "must contain at least one step"));
        }
        job.steps = steps
            .iter()
            .enumerate()
            .map(|(idx, step)| self.step(step, &format!("{steps_field}[{idx}]"), commands))
            .collect::<Result<_>>()?;
        Ok(job)
    }

    fn matrix(&self, value: &Value, field: &str) -> Result<BTreeMap<String, Vec<Scalar>>> {
        let table = self.table(value, field)?;
        let mut matrix = BTreeMap::new();
        for (axis, raw) in table {
            let axis_field = format!("{field}.{axis}");
            let values = self.array(raw, &axis_field, "array of scalars")?;
            if values.is_empty() {
                return Err(self.bad_value(axis_field, "must list at least one value"));
            }
            let values = values
                .iter()
                .enumerate()
                .map(|(idx, v)| self.scalar(v, &format!("{axis_field}[{idx}]")))
                .collect::<Result<Vec<_>>>()?;
            matrix.insert(axis.clone(), values);
        }
        Ok(matrix)
    }

    fn step(&self, value: &Value, prefix: &str, commands: &CommandTable) -> Result<CiStep> {
        let table = self.table(value, prefix)?;
        let present: Vec<&str> = ["run", "command", "uses"]
            .into_iter()
            .filter(|key| table.contains_key(*key))
            .collect();

        let action = match present.as_slice() {
            ["run"] => StepAction::Run(self.text(&table["run"], &field(prefix, "run"))?),
            ["command"] => StepAction::Command(self.declared_command(
                &table["command"],
                &field(prefix, "command"),
                commands,
            )?),
            ["uses"] => StepAction::Uses {
                uses: self.text(&table["uses"], &field(prefix, "uses"))?,
                with: table
                    .get("with")
                    .map(|raw| self.scalar_map(raw, &field(prefix, "with")))
                    .transpose()?
                    .unwrap_or_default(),
            },
            [] => {
                return Err(self.bad_value(prefix, "expected exactly one of run, command or uses"));
            }
            many => {
                return Err(self.bad_value(
                    prefix,
                    format!(
                        "expected exactly one of run, command or uses, got {}",
                        many.join(", ")
                    ),
                ));
            }
        };
        if table.contains_key("with") && !matches!(action, StepAction::Uses { .. }) {
            return Err(self.bad_value(
                field(prefix, "with"),
                "only valid on steps that use an action",
            ));
        }

        Ok(CiStep {
            name: self.opt_text(table, prefix, "name")?,
            if_condition: self.opt_text(table, prefix, "if")?,
            continue_on_error: self
                .opt_bool(table, prefix, "continue_on_error")?
                .unwrap_or(false),
            working_directory: self.opt_text(table, prefix, "working_directory")?,
            env: table
                .get("env")
                .map(|raw| self.scalar_map(raw, &field(prefix, "env")))
                .transpose()?
                .unwrap_or_default(),
            action,
        })
    }

    fn artifacts(&self, value: &Value) -> Result<Vec<CiArtifact>> {
        let items = self.array(value, "[ci.artifacts]", "array of tables")?;
        let mut seen = HashSet::new();
        let mut artifacts = Vec::with_capacity(items.len());

        for (idx, item) in items.iter().enumerate() {
            let prefix = format!("[ci.artifacts][{idx}]");
            let table = self.table(item, &prefix)?;
            let name = self.text(
                self.required(table, &prefix, "name", "non-empty string")?,
                &field(&prefix, "name"),
            )?;
            let path = self.text(
                self.required(table, &prefix, "path", "non-empty string")?,
                &field(&prefix, "path"),
            )?;
            let when = match self.opt_text(table, &prefix, "when")? {
                None => ArtifactWhen::default(),
                Some(raw) => ArtifactWhen::parse(&raw).ok_or_else(|| {
                    self.bad_value(
                        field(&prefix, "when"),
                        format!(
                            "expected one of 'always', 'on-failure', 'on-success', got '{raw}'"
                        ),
                    )
                })?,
            };
            if !seen.insert(name.clone()) {
                return Err(self.duplicate("[ci.artifacts].name", &name));
            }
            artifacts.push(CiArtifact {
                name,
                path,
                retention_days: self.opt_positive(table, &prefix, "retention_days")?,
                when,
            });
        }
        Ok(artifacts)
    }

    fn summary(&self, value: &Value, commands: &CommandTable) -> Result<SummarySpec> {
        let prefix = "[ci.summary]";
        let table = self.table(value, prefix)?;
        let mut summary = SummarySpec {
            enabled: self.opt_bool(table, prefix, "enabled")?.unwrap_or(true),
            title: self
                .opt_text(table, prefix, "title")?
                .unwrap_or_else(|| DEFAULT_SUMMARY_TITLE.to_string()),
            baseline_file: self.opt_text(table, prefix, "baseline_file")?,
            ..SummarySpec::default()
        };
        if let Some(policy) = self.opt_text(table, prefix, "on_missing_baseline")? {
            summary.on_missing_baseline = match policy.as_str() {
                "fail" => BaselinePolicy::Fail,
                "note" => BaselinePolicy::Note,
                other => {
                    return Err(self.bad_value(
                        field(prefix, "on_missing_baseline"),
                        format!("expected one of 'fail', 'note', got '{other}'"),
                    ));
                }
            };
        }
        if let Some(raw) = table.get("metrics") {
            let items = self.array(raw, "[ci.summary.metrics]", "array of tables")?;
            let has_baseline_file = summary.baseline_file.is_some();
            summary.metrics = items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    self.metric(
                        item,
                        &format!("[ci.summary.metrics][{idx}]"),
                        commands,
                        has_baseline_file,
                    )
                })
                .collect::<Result<_>>()?;
        }
        Ok(summary)
    }

    fn metric(
        &self,
        value: &Value,
        prefix: &str,
        commands: &CommandTable,
        has_baseline_file: bool,
    ) -> Result<MetricSpec> {
        let table = self.table(value, prefix)?;
        let label = self.text(
            self.required(table, prefix, "label", "non-empty string")?,
            &field(prefix, "label"),
        )?;
        let command = self.declared_command(
            self.required(table, prefix, "command", "non-empty string")?,
            &field(prefix, "command"),
            commands,
        )?;
        let path = self.json_path(
            self.required(table, prefix, "path", "string path")?,
            &field(prefix, "path"),
        )?;

        let baseline_path = table
            .get("baseline_path")
            .map(|raw| self.json_path(raw, &field(prefix, "baseline_path")))
            .transpose()?;
        let baseline_command = table
            .get("baseline_command")
            .map(|raw| self.declared_command(raw, &field(prefix, "baseline_command"), commands))
            .transpose()?;
        let source = self.opt_text(table, prefix, "baseline_source")?;

        let baseline = match source.as_deref() {
            Some("file") => {
                if !has_baseline_file {
                    return Err(self.bad_value(
                        field(prefix, "baseline_source"),
                        "'file' requires [ci.summary].baseline_file",
                    ));
                }
                if baseline_command.is_some() {
                    return Err(self.bad_value(
                        field(prefix, "baseline_command"),
                        "cannot be combined with baseline_source = 'file'",
                    ));
                }
                Some(BaselineSource::File {
                    path: baseline_path.unwrap_or_else(|| path.clone()),
                })
            }
            Some("command") | None => match (baseline_command, baseline_path) {
                (Some(command), baseline_path) => Some(BaselineSource::Command {
                    command,
                    path: baseline_path.unwrap_or_else(|| path.clone()),
                }),
                (None, Some(path)) => Some(BaselineSource::SamePayload { path }),
                (None, None) => None,
            },
            Some(other) => {
                return Err(self.bad_value(
                    field(prefix, "baseline_source"),
                    format!("expected one of 'command', 'file', got '{other}'"),
                ));
            }
        };

        let precision = match table.get("precision") {
            None => None,
            Some(raw) => {
                let precision_field = field(prefix, "precision");
                let n = raw
                    .as_integer()
                    .ok_or_else(|| self.invalid(&precision_field, "integer", raw))?;
                if !(0..=MAX_PRECISION).contains(&n) {
                    return Err(self.bad_value(
                        precision_field,
                        format!("expected 0..={MAX_PRECISION}, got {n}"),
                    ));
                }
                Some(n as u32)
            }
        };

        Ok(MetricSpec {
            label,
            command,
            path,
            baseline,
            precision,
        })
    }

    fn checks(
        &self,
        doc: &Table,
        commands: &CommandTable,
        operators: &OperatorTable,
    ) -> Result<ChecksConfig> {
        let Some(section) = self.section(doc, "checks")? else {
            return Ok(ChecksConfig::default());
        };
        let mut checks = ChecksConfig {
            timeout: self.timeout(section, "[checks]")?,
            ..ChecksConfig::default()
        };

        if let Some(raw) = section.get("assertions") {
            let items = self.array(raw, "[checks.assertions]", "array of tables")?;
            for (idx, item) in items.iter().enumerate() {
                let prefix = format!("[checks.assertions][{idx}]");
                checks
                    .assertions
                    .push(self.assertion(item, &prefix, commands, operators)?);
            }
        }

        if let Some(raw) = section.get("gates") {
            let items = self.array(raw, "[checks.gates]", "array of tables")?;
            let mut seen = HashSet::new();
            for (idx, item) in items.iter().enumerate() {
                let prefix = format!("[checks.gates][{idx}]");
                let gate = self.gate(item, &prefix, commands)?;
                if !seen.insert(gate.name.clone()) {
                    return Err(self.duplicate("[checks.gates].name", &gate.name));
                }
                checks.gates.push(gate);
            }
        }
        Ok(checks)
    }

    fn assertion(
        &self,
        value: &Value,
        prefix: &str,
        commands: &CommandTable,
        operators: &OperatorTable,
    ) -> Result<CheckAssertion> {
        let table = self.table(value, prefix)?;
        let command = self.declared_command(
            self.required(table, prefix, "command", "non-empty string")?,
            &field(prefix, "command"),
            commands,
        )?;
        let path = self.json_path(
            self.required(table, prefix, "path", "string path")?,
            &field(prefix, "path"),
        )?;
        let op_field = field(prefix, "op");
        let op_name = self.text(self.required(table, prefix, "op", "string")?, &op_field)?;
        let op = operators.lookup(&op_name).ok_or_else(|| {
            self.bad_value(
                &op_field,
                format!(
                    "unknown operator '{op_name}', expected one of {}",
                    operators.list_known().join(", ")
                ),
            )
        })?;
        let expected = self.required(table, prefix, "value", "value")?;
        if op.is_membership() && !expected.is_array() {
            return Err(self.invalid(field(prefix, "value"), "array", expected));
        }

        Ok(CheckAssertion {
            command,
            path,
            op,
            expected: toml_to_json(expected),
            message: self.opt_text(table, prefix, "message")?,
        })
    }

    fn gate(&self, value: &Value, prefix: &str, commands: &CommandTable) -> Result<CheckGate> {
        let table = self.table(value, prefix)?;
        let name = self.text(
            self.required(table, prefix, "name", "non-empty string")?,
            &field(prefix, "name"),
        )?;
        let kind_field = field(prefix, "kind");
        let kind_name = self.text(self.required(table, prefix, "kind", "string")?, &kind_field)?;
        let command = self.declared_command(
            self.required(table, prefix, "command", "non-empty string")?,
            &field(prefix, "command"),
            commands,
        )?;
        let path = self.json_path(
            self.required(table, prefix, "path", "string path")?,
            &field(prefix, "path"),
        )?;

        let kind = match kind_name.as_str() {
            "threshold" => {
                let max = self.number(
                    self.required(table, prefix, "max", "number")?,
                    &field(prefix, "max"),
                )?;
                let min = table
                    .get("min")
                    .map(|raw| self.number(raw, &field(prefix, "min")))
                    .transpose()?;
                if let Some(min) = min
                    && min > max
                {
                    return Err(self.bad_value(
                        field(prefix, "min"),
                        format!("min {min} is greater than max {max}"),
                    ));
                }
                GateKind::Threshold { max, min }
            }
            "equals" => GateKind::Equals {
                value: toml_to_json(self.required(table, prefix, "value", "value")?),
            },
            other => {
                return Err(self.bad_value(
                    kind_field,
                    format!("expected one of 'threshold', 'equals', got '{other}'"),
                ));
            }
        };

        Ok(CheckGate {
            name,
            command,
            path,
            kind,
        })
    }

    fn plugins(&self, doc: &Table) -> Result<PluginsConfig> {
        let Some(section) = self.section(doc, "plugins")? else {
            return Ok(PluginsConfig::default());
        };
        Ok(PluginsConfig {
            check: section
                .get("check")
                .map(|raw| self.string_list(raw, "[plugins].check"))
                .transpose()?
                .unwrap_or_default(),
            generate: section
                .get("generate")
                .map(|raw| self.string_list(raw, "[plugins].generate"))
                .transpose()?
                .unwrap_or_default(),
            timeout: self.timeout(section, "[plugins]")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Active,
    Done,
}

/// Return the first `needs` cycle found, as job names with the start
/// repeated at the end.
fn find_needs_cycle(jobs: &[CiJob]) -> Option<Vec<String>> {
    let index: HashMap<&str, usize> = jobs
        .iter()
        .enumerate()
        .map(|(idx, job)| (job.name.as_str(), idx))
        .collect();
    let mut marks = vec![Mark::New; jobs.len()];
    let mut stack = Vec::new();

    (0..jobs.len()).find_map(|start| {
        if marks[start] == Mark::New {
            visit(start, jobs, &index, &mut marks, &mut stack)
        } else {
            None
        }
    })
}

fn visit(
    node: usize,
    jobs: &[CiJob],
    index: &HashMap<&str, usize>,
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
) -> Option<Vec<String>> {
    marks[node] = Mark::Active;
    stack.push(node);

    for need in &jobs[node].needs {
        let Some(&next) = index.get(need.as_str()) else {
            continue;
        };
        match marks[next] {
            Mark::Active => {
                let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle: Vec<String> =
                    stack[start..].iter().map(|&n| jobs[n].name.clone()).collect();
                cycle.push(jobs[next].name.clone());
                return Some(cycle);
            }
            Mark::New => {
                if let Some(cycle) = visit(next, jobs, index, marks, stack) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    stack.pop();
    marks[node] = Mark::Done;
    None
}
