//! Generated-file drift classification.

use intent_fs::{Filesystem, NormalizedPath};
use intent_meta::{Code, IntentConfig};
use intent_render::{Target, is_generated};
use serde::Serialize;

use crate::error::Result;

/// State of one managed file relative to its expected content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Missing,
    Unowned,
    OutOfDate,
    UpToDate,
}

impl FileState {
    /// Classify from the three observable facts, in precedence order.
    pub fn classify(exists: bool, owned: bool, matches: bool) -> Self {
        match (exists, owned, matches) {
            (false, _, _) => Self::Missing,
            (true, false, _) => Self::Unowned,
            (true, true, false) => Self::OutOfDate,
            (true, true, true) => Self::UpToDate,
        }
    }

    pub fn ok(&self) -> bool {
        *self == Self::UpToDate
    }

    pub fn code(&self) -> Code {
        match self {
            Self::Missing => Code::FileMissing,
            Self::Unowned => Code::FileUnowned,
            Self::OutOfDate => Code::FileOutOfDate,
            Self::UpToDate => Code::FileUpToDate,
        }
    }

    pub fn describe(&self, path: &str) -> String {
        match self {
            Self::Missing => format!("{path} is missing"),
            Self::Unowned => format!("{path} exists but is not tool-owned (missing marker)"),
            Self::OutOfDate => format!("{path} is out of date"),
            Self::UpToDate => format!("{path} is up to date"),
        }
    }
}

/// Drift finding for one generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub ok: bool,
    pub message: String,
    pub code: Code,
    #[serde(skip)]
    pub state: FileState,
}

impl FileReport {
    fn new(path: &NormalizedPath, state: FileState) -> Self {
        Self {
            path: path.to_string(),
            ok: state.ok(),
            message: state.describe(path.as_str()),
            code: state.code(),
            state,
        }
    }
}

/// Compare the file at `path` with `expected`.
pub fn detect(fs: &dyn Filesystem, path: &NormalizedPath, expected: &str) -> Result<FileReport> {
    let state = match fs.read_optional(path)? {
        None => FileState::Missing,
        Some(current) => FileState::classify(true, is_generated(&current), current == expected),
    };
    Ok(FileReport::new(path, state))
}

/// Drift for every generated target, in render order.
pub fn detect_all(fs: &dyn Filesystem, config: &IntentConfig) -> Result<Vec<FileReport>> {
    Target::ALL
        .iter()
        .map(|target| detect(fs, &target.path().path(), &target.render(config)))
        .collect()
}
