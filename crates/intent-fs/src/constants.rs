//! Well-known project paths.

use std::path::Path;

use crate::NormalizedPath;

/// Files intent reads or manages, relative to the project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedPath {
    /// The declarative source of truth
    IntentConfig,
    /// Generated GitHub Actions workflow
    CiWorkflow,
    /// Generated task-runner recipes
    Justfile,
    /// Python project manifest carrying `requires-python`
    Pyproject,
    /// Single-value interpreter pin
    PythonVersion,
    /// asdf/mise tool-manager pins
    ToolVersions,
}

impl ManagedPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntentConfig => "intent.toml",
            Self::CiWorkflow => ".github/workflows/ci.yml",
            Self::Justfile => "justfile",
            Self::Pyproject => "pyproject.toml",
            Self::PythonVersion => ".python-version",
            Self::ToolVersions => ".tool-versions",
        }
    }

    pub fn path(&self) -> NormalizedPath {
        NormalizedPath::new(self.as_str())
    }

    /// The generated targets, in render order.
    pub fn generated() -> &'static [ManagedPath] {
        &[Self::CiWorkflow, Self::Justfile]
    }
}

impl AsRef<Path> for ManagedPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ManagedPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ManagedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
