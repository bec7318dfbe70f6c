//! Error types for intent-core

use crate::generated::WriteMode;

/// Result type for intent-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in intent-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The target holds foreign content the write mode may not replace
    #[error(
        "Refusing to overwrite {path}: file exists but is not tool-owned (mode: {mode}); \
         re-run with --force to replace it"
    )]
    Ownership { path: String, mode: WriteMode },

    /// Rendered content lacks the ownership marker
    #[error("Rendered content for {path} is missing the ownership marker")]
    MissingMarker { path: String },

    /// A plugin hook exited non-zero or could not run
    #[error("{stage} hook failed: {command}: {message}")]
    HookFailed {
        stage: String,
        command: String,
        message: String,
    },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from intent-fs
    #[error(transparent)]
    Fs(#[from] intent_fs::Error),

    /// Configuration error from intent-meta
    #[error(transparent)]
    Meta(#[from] intent_meta::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
