//! Ownership-gated writes of generated files
//!
//! A file is tool-owned iff its content contains the ownership marker.
//! Foreign content is never replaced unless the caller asks for
//! [`WriteMode::Force`].

use std::fmt;

use intent_fs::{Filesystem, NormalizedPath};
use intent_render::is_generated;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// How a write treats existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Write only when the file is absent or already tool-owned
    #[default]
    Strict,
    /// Explicit opt-in to take over a file; still never replaces foreign
    /// content
    Adopt,
    /// Overwrite regardless of ownership
    Force,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Adopt => write!(f, "adopt"),
            Self::Force => write!(f, "force"),
        }
    }
}

/// What a write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

impl WriteOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Write `content` to `path` under the ownership rules of `mode`.
///
/// Fails before any I/O when `content` itself lacks the marker.
pub fn write_generated(
    fs: &dyn Filesystem,
    path: &NormalizedPath,
    content: &str,
    mode: WriteMode,
) -> Result<WriteOutcome> {
    if !is_generated(content) {
        return Err(Error::MissingMarker {
            path: path.to_string(),
        });
    }

    let outcome = match fs.read_optional(path)? {
        None => WriteOutcome::Created,
        Some(existing) if existing == content => {
            debug!(path = %path, "Generated file unchanged");
            return Ok(WriteOutcome::Unchanged);
        }
        Some(existing) => {
            if !is_generated(&existing) && mode != WriteMode::Force {
                return Err(Error::Ownership {
                    path: path.to_string(),
                    mode,
                });
            }
            WriteOutcome::Updated
        }
    };

    fs.write_text(path, content)?;
    info!(path = %path, ?outcome, %mode, "Wrote generated file");
    Ok(outcome)
}

/// Preview line for a pending write, without touching the file.
pub fn preview(fs: &dyn Filesystem, path: &NormalizedPath, content: &str) -> Result<String> {
    Ok(match fs.read_optional(path)? {
        None => format!("Would write {path}"),
        Some(existing) if existing == content => format!("No changes to {path}"),
        Some(_) => format!("Would update {path}"),
    })
}
