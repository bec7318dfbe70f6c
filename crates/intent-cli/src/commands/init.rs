//! `intent init`

use std::fmt;

use colored::Colorize;
use intent_core::PyprojectStatus;
use intent_core::pyproject::read_requires_python;
use intent_core::reconcile::python_version_pin;
use intent_fs::{Filesystem, ManagedPath};
use intent_meta::{Code, ConstraintSet, SCHEMA_VERSION, VersionTuple};
use tracing::debug;

use crate::context::ProjectContext;
use crate::error::{CliError, EXIT_OK, Result};

/// Declared version when nothing better is known.
pub const DEFAULT_PYTHON: &str = "3.12";

/// Where an inferred version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    Pyproject,
    PythonVersion,
    Default,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pyproject => write!(f, "pyproject"),
            Self::PythonVersion => write!(f, ".python-version"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Run the init command
pub fn run_init(ctx: &ProjectContext, from_existing: bool, force: bool) -> Result<u8> {
    let path = ctx.config_path();
    if ctx.has_config() && !force {
        return Err(CliError::usage(
            Code::InitExists,
            format!("{path} already exists; re-run with --force to overwrite it"),
        ));
    }

    let (version, source) = if from_existing {
        detect_python(ctx.fs())?
    } else {
        (DEFAULT_PYTHON.to_string(), VersionSource::Default)
    };
    ctx.fs().write_text(path, &starter_config(&version))?;

    println!("{} Wrote {path}", "OK".green().bold());
    if from_existing {
        println!("Python version: {version} ({source})");
    }
    println!("Next: run {} to generate CI and the justfile.", "intent sync --write".cyan());
    Ok(EXIT_OK)
}

/// Infer `major.minor` from `pyproject.toml`'s lower bound, then
/// `.python-version`, falling back to [`DEFAULT_PYTHON`].
pub fn detect_python(fs: &dyn Filesystem) -> Result<(String, VersionSource)> {
    if let PyprojectStatus::Ok(spec) = read_requires_python(fs)?
        && let Some(lower) = ConstraintSet::parse(&spec).max_lower_bound()
    {
        debug!(%spec, "Inferred python version from pyproject.toml");
        return Ok((lower.truncate_minor().to_string(), VersionSource::Pyproject));
    }

    if let Some(text) = fs.read_optional(&ManagedPath::PythonVersion.path())?
        && let Some(pin) = python_version_pin(&text)
        && let Ok(version) = VersionTuple::parse(pin)
    {
        return Ok((version.truncate_minor().to_string(), VersionSource::PythonVersion));
    }

    Ok((DEFAULT_PYTHON.to_string(), VersionSource::Default))
}

/// A starter config that validates as-is.
pub fn starter_config(version: &str) -> String {
    format!(
        "[intent]\n\
         schema_version = {SCHEMA_VERSION}\n\
         \n\
         [python]\n\
         version = \"{version}\"\n\
         \n\
         [commands]\n\
         test = \"pytest -q\"\n\
         lint = \"ruff check .\"\n"
    )
}
