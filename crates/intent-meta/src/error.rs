//! Error types for intent-meta

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration and version-model errors.
///
/// Every config variant names the source file and the offending field so a
/// user can jump straight to the problem.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] intent_fs::Error),

    #[error("{} does not exist", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: String, message: String },

    #[error("{path}: invalid {field} (expected {expected}, got {actual})")]
    InvalidField {
        path: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: missing {field} (expected {expected})")]
    MissingField {
        path: String,
        field: String,
        expected: String,
    },

    #[error("{path}: invalid {field} ({message})")]
    InvalidValue {
        path: String,
        field: String,
        message: String,
    },

    #[error("{path}: {field} references unknown {kind} '{name}'")]
    UnknownReference {
        path: String,
        field: String,
        kind: &'static str,
        name: String,
    },

    #[error("{path}: duplicate {field} '{name}'")]
    Duplicate {
        path: String,
        field: String,
        name: String,
    },

    #[error("{path}: [ci.jobs] needs form a cycle: {cycle}")]
    NeedsCycle { path: String, cycle: String },

    #[error("{path}: unsupported [intent].schema_version={found} (expected {expected})")]
    UnsupportedSchema {
        path: String,
        found: i64,
        expected: u32,
    },

    #[error("Invalid python version '{input}' (expected like '3.12')")]
    InvalidVersion { input: String },
}
