//! Read-only access to `[project].requires-python`.

use intent_fs::{Filesystem, ManagedPath};
use serde::Serialize;
use toml::{Table, Value};
use tracing::debug;

use crate::error::Result;

/// What `pyproject.toml` says about the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyprojectStatus {
    /// `requires-python` is set to this spec
    Ok(String),
    FileMissing,
    ProjectMissing,
    RequiresPythonMissing,
    /// The file or the value could not be used
    Invalid(String),
}

impl PyprojectStatus {
    /// Stable status name used in JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ok(_) => "OK",
            Self::FileMissing => "FILE_MISSING",
            Self::ProjectMissing => "PROJECT_MISSING",
            Self::RequiresPythonMissing => "REQUIRES_PYTHON_MISSING",
            Self::Invalid(_) => "INVALID",
        }
    }

    pub fn spec(&self) -> Option<&str> {
        match self {
            Self::Ok(spec) => Some(spec),
            _ => None,
        }
    }
}

impl Serialize for PyprojectStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Read the project's `requires-python`.
pub fn read_requires_python(fs: &dyn Filesystem) -> Result<PyprojectStatus> {
    let Some(text) = fs.read_optional(&ManagedPath::Pyproject.path())? else {
        return Ok(PyprojectStatus::FileMissing);
    };
    Ok(parse_requires_python(&text))
}

/// Classify manifest text.
pub fn parse_requires_python(text: &str) -> PyprojectStatus {
    let doc: Table = match toml::from_str(text) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(error = %e.message(), "pyproject.toml is not valid TOML");
            return PyprojectStatus::Invalid(e.message().trim().to_string());
        }
    };
    let Some(Value::Table(project)) = doc.get("project") else {
        return PyprojectStatus::ProjectMissing;
    };
    match project.get("requires-python") {
        None => PyprojectStatus::RequiresPythonMissing,
        Some(Value::String(spec)) if spec.trim().is_empty() => {
            PyprojectStatus::Invalid("requires-python is empty".to_string())
        }
        Some(Value::String(spec)) => PyprojectStatus::Ok(spec.trim().to_string()),
        Some(other) => PyprojectStatus::Invalid(format!(
            "requires-python must be a string, got {}",
            other.type_str()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("[project]\nrequires-python = \">=3.12\"\n", PyprojectStatus::Ok(">=3.12".into()))]
    #[case("[tool.x]\na = 1\n", PyprojectStatus::ProjectMissing)]
    #[case("project = 1\n", PyprojectStatus::ProjectMissing)]
    #[case("[project]\nname = \"demo\"\n", PyprojectStatus::RequiresPythonMissing)]
    fn test_parse(#[case] text: &str, #[case] expected: PyprojectStatus) {
        assert_eq!(parse_requires_python(text), expected);
    }

    #[rstest]
    #[case("[project\n")]
    #[case("[project]\nrequires-python = 3.12\n")]
    #[case("[project]\nrequires-python = \" \"\n")]
    fn test_parse_invalid(#[case] text: &str) {
        let status = parse_requires_python(text);
        assert_eq!(status.name(), "INVALID", "{status:?}");
    }
}
