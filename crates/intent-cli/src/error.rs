//! Error types for intent-cli

use intent_meta::Code;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Clean run.
pub const EXIT_OK: u8 = 0;
/// Drift, check failure or refused write.
pub const EXIT_FAILURE: u8 = 1;
/// Config or usage error.
pub const EXIT_USAGE: u8 = 2;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from intent-core
    #[error(transparent)]
    Core(#[from] intent_core::Error),

    /// The config could not be loaded or validated
    #[error("Config error: {0}")]
    Config(#[from] intent_meta::Error),

    /// Error from intent-fs
    #[error(transparent)]
    Fs(#[from] intent_fs::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Usage error carrying a stable code, e.g. a missing config
    #[error("[{code}] {message}")]
    Usage { code: Code, message: String },
}

impl CliError {
    /// A usage error with a stable code
    pub fn usage(code: Code, message: impl Into<String>) -> Self {
        Self::Usage {
            code,
            message: message.into(),
        }
    }

    /// Stable machine code, when one applies.
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Usage { code, .. } => Some(*code),
            Self::Config(_) | Self::Core(intent_core::Error::Meta(_)) => Some(Code::ConfigInvalid),
            Self::Core(intent_core::Error::Ownership { .. }) => Some(Code::FileOwnership),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage { .. } | Self::Config(_) | Self::Core(intent_core::Error::Meta(_)) => {
                EXIT_USAGE
            }
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_error_carries_code() {
        let error = CliError::usage(Code::ExclusiveFlags, "choose exactly one of --plan or --apply");
        assert_eq!(
            error.to_string(),
            "[INTENT003] choose exactly one of --plan or --apply"
        );
        assert_eq!(error.exit_code(), EXIT_USAGE);
        assert_eq!(error.code(), Some(Code::ExclusiveFlags));
    }

    #[test]
    fn test_config_errors_exit_two() {
        let error = CliError::from(intent_meta::Error::InvalidVersion { input: "x".into() });
        assert_eq!(error.exit_code(), EXIT_USAGE);
        assert!(error.to_string().starts_with("Config error: "));
    }
}
