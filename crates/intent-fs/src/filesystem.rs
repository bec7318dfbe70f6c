//! The narrow filesystem interface consumed by the core.

use std::path::Path;

use tracing::trace;

use crate::{Error, NormalizedPath, Result, io};

/// Existence check, read and write against project-relative paths.
///
/// Implemented by [`LocalFs`] for real projects and by in-memory fakes in
/// tests, so drift detection and reconciliation never touch `std::fs`
/// directly.
pub trait Filesystem {
    fn exists(&self, path: &NormalizedPath) -> bool;

    fn read_text(&self, path: &NormalizedPath) -> Result<String>;

    fn write_text(&self, path: &NormalizedPath, content: &str) -> Result<()>;

    /// Read a file, mapping absence to `None`.
    fn read_optional(&self, path: &NormalizedPath) -> Result<Option<String>> {
        if !self.exists(path) {
            return Ok(None);
        }
        match self.read_text(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Filesystem rooted at a project directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: NormalizedPath,
}

impl LocalFs {
    /// Root the filesystem at `root`, canonicalized when it exists.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let resolved = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            root: NormalizedPath::new(resolved),
        }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    fn resolve(&self, path: &NormalizedPath) -> Result<NormalizedPath> {
        if !path.is_contained() {
            return Err(Error::OutsideRoot {
                path: path.to_string(),
            });
        }
        Ok(self.root.join(path.as_str()))
    }
}

impl Filesystem for LocalFs {
    fn exists(&self, path: &NormalizedPath) -> bool {
        self.resolve(path).map(|p| p.to_native().is_file()).unwrap_or(false)
    }

    fn read_text(&self, path: &NormalizedPath) -> Result<String> {
        let full = self.resolve(path)?;
        trace!(path = %full, "reading");
        io::read_text(&full)
    }

    fn write_text(&self, path: &NormalizedPath, content: &str) -> Result<()> {
        let full = self.resolve(path)?;
        io::write_text(&full, content)
    }
}
