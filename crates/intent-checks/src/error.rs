//! Error types for command execution

/// Errors raised while running a command
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' timed out after {timeout:?}")]
    Timeout {
        command: String,
        timeout: std::time::Duration,
    },

    #[error("failed to start process runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Result type for command execution
pub type Result<T> = std::result::Result<T, Error>;
