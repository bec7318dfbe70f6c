//! Alignment of version pin files with the declared version
//!
//! Three independent files pin the interpreter: the `pyproject.toml` range,
//! `.python-version` and the `python` entry of `.tool-versions`. Each is
//! classified by comparing `major.minor` only, so patch-level pins stay
//! aligned. Planning never writes. Applying creates absent files, and edits
//! existing ones only when the caller allows it.

use std::fmt;

use intent_fs::{Filesystem, ManagedPath};
use intent_meta::version::{ConstraintOp, ConstraintSet, Satisfaction, recommended_range};
use intent_meta::{Code, IntentConfig, VersionTuple};
use toml_edit::{DocumentMut, Item, Table, value};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pyproject::{PyprojectStatus, parse_requires_python};

const TOOL_VERSIONS_KEY: &str = "python";

/// A version pin file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinFile {
    Pyproject,
    PythonVersion,
    ToolVersions,
}

impl PinFile {
    pub const ALL: [PinFile; 3] = [Self::Pyproject, Self::PythonVersion, Self::ToolVersions];

    pub fn managed_path(&self) -> ManagedPath {
        match self {
            Self::Pyproject => ManagedPath::Pyproject,
            Self::PythonVersion => ManagedPath::PythonVersion,
            Self::ToolVersions => ManagedPath::ToolVersions,
        }
    }
}

impl fmt::Display for PinFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.managed_path().as_str())
    }
}

/// Current state of one pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinStatus {
    Aligned { current: String },
    Drift { current: String },
    /// File absent, or present without a usable pin
    Missing { file_exists: bool },
}

impl PinStatus {
    pub fn code(&self) -> Code {
        match self {
            Self::Aligned { .. } => Code::ReconcileAligned,
            Self::Drift { .. } => Code::ReconcileDrift,
            Self::Missing { .. } => Code::ReconcileMissing,
        }
    }
}

/// Classification and recommended action for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinPlan {
    pub file: PinFile,
    pub status: PinStatus,
    /// Value the file should carry
    pub recommended: String,
    /// Human-readable change, absent when aligned
    pub action: Option<String>,
}

impl PinPlan {
    /// One-line status, e.g. `.python-version: drift (3.11.9)`.
    pub fn describe(&self) -> String {
        let state = match (&self.status, self.file) {
            (PinStatus::Aligned { current }, _) => format!("aligned ({current})"),
            (PinStatus::Drift { current }, _) => format!("drift ({current})"),
            (PinStatus::Missing { .. }, PinFile::Pyproject) => {
                "missing requires-python".to_string()
            }
            (PinStatus::Missing { .. }, PinFile::PythonVersion) => "missing".to_string(),
            (PinStatus::Missing { .. }, PinFile::ToolVersions) => {
                "missing or no python entry".to_string()
            }
        };
        format!("{}: {state}", self.file)
    }
}

/// The full plan for a declared version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Declared version as written in the config
    pub target: String,
    pub pins: Vec<PinPlan>,
}

/// What apply did to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Unchanged,
    Created,
    Updated,
    /// Left untouched; the drift remains unresolved
    Skipped { reason: String },
}

impl ApplyOutcome {
    pub fn code(&self, status: &PinStatus) -> Code {
        match self {
            Self::Skipped { .. } => Code::ReconcileSkipped,
            _ => status.code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub target: String,
    pub results: Vec<(PinPlan, ApplyOutcome)>,
}

impl ApplyReport {
    /// No file was left unresolved.
    pub fn clean(&self) -> bool {
        !self
            .results
            .iter()
            .any(|(_, outcome)| matches!(outcome, ApplyOutcome::Skipped { .. }))
    }
}

/// Classify every pin file without modifying anything.
pub fn plan(fs: &dyn Filesystem, config: &IntentConfig) -> Result<ReconcilePlan> {
    let pins = PinFile::ALL
        .iter()
        .map(|file| {
            let current = fs.read_optional(&file.managed_path().path())?;
            Ok(plan_file(*file, current.as_deref(), config))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ReconcilePlan {
        target: config.python_version.clone(),
        pins,
    })
}

/// Apply the plan; existing files change only with `allow_existing`.
pub fn apply(
    fs: &dyn Filesystem,
    config: &IntentConfig,
    allow_existing: bool,
) -> Result<ApplyReport> {
    let plan = plan(fs, config)?;
    let mut results = Vec::with_capacity(plan.pins.len());

    for pin in plan.pins {
        let path = pin.file.managed_path().path();
        let outcome = match &pin.status {
            PinStatus::Aligned { .. } => ApplyOutcome::Unchanged,
            PinStatus::Missing { file_exists: false } => {
                fs.write_text(&path, &fresh_content(pin.file, config))?;
                info!(path = %path, "Created version pin file");
                ApplyOutcome::Created
            }
            _ if !allow_existing => {
                warn!(path = %path, "Skipping existing version pin file");
                ApplyOutcome::Skipped {
                    reason: "existing file; use --allow-existing to update it".to_string(),
                }
            }
            _ => {
                let current = fs.read_text(&path)?;
                match upsert(pin.file, &current, config) {
                    Ok(updated) => {
                        fs.write_text(&path, &updated)?;
                        info!(path = %path, "Updated version pin file");
                        ApplyOutcome::Updated
                    }
                    Err(reason) => {
                        warn!(path = %path, %reason, "Could not update version pin file");
                        ApplyOutcome::Skipped { reason }
                    }
                }
            }
        };
        results.push((pin, outcome));
    }

    Ok(ApplyReport {
        target: plan.target,
        results,
    })
}

fn plan_file(file: PinFile, current: Option<&str>, config: &IntentConfig) -> PinPlan {
    let declared = &config.python_version;
    let status = match current {
        None => PinStatus::Missing { file_exists: false },
        Some(text) => match file {
            PinFile::Pyproject => classify_pyproject(text, &config.python),
            PinFile::PythonVersion => classify_pin(python_version_pin(text), &config.python),
            PinFile::ToolVersions => classify_pin(tool_versions_pin(text), &config.python),
        },
    };
    debug!(file = %file, ?status, "Classified version pin");

    let recommended = match file {
        PinFile::Pyproject => recommended_range(&config.python),
        PinFile::PythonVersion => declared.clone(),
        PinFile::ToolVersions => format!("{TOOL_VERSIONS_KEY} {declared}"),
    };
    let action = match (&status, file) {
        (PinStatus::Aligned { .. }, _) => None,
        (_, PinFile::Pyproject) => Some(format!("set requires-python = {recommended}")),
        (PinStatus::Drift { .. }, PinFile::PythonVersion) => {
            Some(format!("replace with {recommended}"))
        }
        (_, PinFile::PythonVersion) => Some(format!("write {recommended}")),
        (PinStatus::Drift { .. }, PinFile::ToolVersions) => {
            Some(format!("replace python entry with `{recommended}`"))
        }
        (_, PinFile::ToolVersions) => Some(format!("add `{recommended}`")),
    };

    PinPlan {
        file,
        status,
        recommended,
        action,
    }
}

fn same_minor(a: &VersionTuple, b: &VersionTuple) -> bool {
    a.major_minor() == b.major_minor()
}

fn classify_pyproject(text: &str, declared: &VersionTuple) -> PinStatus {
    match parse_requires_python(text) {
        PyprojectStatus::Ok(spec) => {
            if range_aligned(&ConstraintSet::parse(&spec), declared) {
                PinStatus::Aligned { current: spec }
            } else {
                PinStatus::Drift { current: spec }
            }
        }
        PyprojectStatus::Invalid(reason) => PinStatus::Drift {
            current: format!("invalid: {reason}"),
        },
        PyprojectStatus::FileMissing
        | PyprojectStatus::ProjectMissing
        | PyprojectStatus::RequiresPythonMissing => PinStatus::Missing { file_exists: true },
    }
}

/// An exact pin (`3.12`, `==3.12.4`) aligns on `major.minor`; a range must
/// admit the declared version and have its floor on the same minor.
fn range_aligned(set: &ConstraintSet, declared: &VersionTuple) -> bool {
    if let [only] = set.clauses()
        && set.is_supported()
        && only.op == ConstraintOp::Eq
    {
        return same_minor(&only.version, declared);
    }
    set.satisfied_by(declared) == Satisfaction::Satisfied
        && set
            .max_lower_bound()
            .is_some_and(|lower| same_minor(lower, declared))
}

fn classify_pin(pin: Option<&str>, declared: &VersionTuple) -> PinStatus {
    let Some(current) = pin else {
        return PinStatus::Missing { file_exists: true };
    };
    match VersionTuple::parse(current) {
        Ok(version) if same_minor(&version, declared) => PinStatus::Aligned {
            current: current.to_string(),
        },
        _ => PinStatus::Drift {
            current: current.to_string(),
        },
    }
}

/// First non-comment line of `.python-version`.
pub fn python_version_pin(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
}

/// First version of the `python` entry in `.tool-versions`.
fn tool_versions_pin(text: &str) -> Option<&str> {
    text.lines().find_map(|line| {
        let mut tokens = line.split('#').next()?.split_whitespace();
        (tokens.next()? == TOOL_VERSIONS_KEY)
            .then(|| tokens.next())
            .flatten()
    })
}

fn fresh_content(file: PinFile, config: &IntentConfig) -> String {
    let declared = &config.python_version;
    match file {
        PinFile::Pyproject => format!(
            "[project]\nrequires-python = \"{}\"\n",
            recommended_range(&config.python)
        ),
        PinFile::PythonVersion => format!("{declared}\n"),
        PinFile::ToolVersions => format!("{TOOL_VERSIONS_KEY} {declared}\n"),
    }
}

/// Insert or replace the single pin in `current`, keeping everything else.
pub fn upsert(file: PinFile, current: &str, config: &IntentConfig) -> std::result::Result<String, String> {
    let declared = &config.python_version;
    match file {
        PinFile::Pyproject => upsert_requires_python(current, &recommended_range(&config.python)),
        PinFile::PythonVersion => Ok(upsert_line(
            current,
            |line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('#')
            },
            |_| declared.clone(),
            declared,
            true,
        )),
        PinFile::ToolVersions => Ok(upsert_line(
            current,
            |line| tool_versions_key(line) == Some(TOOL_VERSIONS_KEY),
            |line| replace_first_version(line, declared),
            &format!("{TOOL_VERSIONS_KEY} {declared}"),
            false,
        )),
    }
}

/// Rewrite the first line matching `is_pin`, or add `addition` at the top
/// (`prepend`) or bottom. The file's line ending is kept.
fn upsert_line(
    current: &str,
    is_pin: impl Fn(&str) -> bool,
    rewrite: impl Fn(&str) -> String,
    addition: &str,
    prepend: bool,
) -> String {
    let newline = if current.contains("\r\n") { "\r\n" } else { "\n" };
    let mut lines: Vec<String> = current.lines().map(str::to_string).collect();
    match lines.iter().position(|line| is_pin(line.as_str())) {
        Some(idx) => {
            let updated = rewrite(&lines[idx]);
            lines[idx] = updated;
        }
        None if prepend => lines.insert(0, addition.to_string()),
        None => lines.push(addition.to_string()),
    }
    let mut out = lines.join(newline);
    out.push_str(newline);
    out
}

fn tool_versions_key(line: &str) -> Option<&str> {
    line.split('#').next()?.split_whitespace().next()
}

/// Swap the first version of a `.tool-versions` entry, keeping fallback
/// versions, spacing and any trailing comment.
fn replace_first_version(line: &str, declared: &str) -> String {
    let code = &line[..line.find('#').unwrap_or(line.len())];
    let Some(key_start) = code.find(TOOL_VERSIONS_KEY) else {
        return line.to_string();
    };
    let key_end = key_start + TOOL_VERSIONS_KEY.len();
    let rest = &code[key_end..];
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        return format!("{} {declared}{}", &line[..key_end], &line[key_end..]);
    }
    let start = key_end + (rest.len() - trimmed.len());
    let end = start + trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    format!("{}{declared}{}", &line[..start], &line[end..])
}

fn upsert_requires_python(current: &str, range: &str) -> std::result::Result<String, String> {
    let mut doc: DocumentMut = current
        .parse()
        .map_err(|e| format!("pyproject.toml is not valid TOML: {e}"))?;
    if !doc.contains_key("project") {
        doc.insert("project", Item::Table(Table::new()));
    }
    let project = doc
        .get_mut("project")
        .and_then(Item::as_table_like_mut)
        .ok_or_else(|| "[project] is not a table".to_string())?;

    match project.get_mut("requires-python") {
        Some(item) => {
            let decor = item.as_value().map(|v| v.decor().clone());
            *item = value(range);
            if let (Some(decor), Some(v)) = (decor, item.as_value_mut()) {
                *v.decor_mut() = decor;
            }
        }
        None => {
            project.insert("requires-python", value(range));
        }
    }
    Ok(doc.to_string())
}
