//! Project context shared by every command
//!
//! Resolves `--root` and `--config` once and hands out the filesystem and
//! command-runner collaborators rooted at the project.

use std::path::{Path, PathBuf};

use intent_checks::ShellRunner;
use intent_fs::{Filesystem, LocalFs, NormalizedPath};
use intent_meta::{Code, ConfigLoader, IntentConfig, OperatorTable, PolicyPackRegistry};
use tracing::debug;

use crate::error::{CliError, Result};

/// A project rooted at a directory with its config path.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    root: PathBuf,
    config: NormalizedPath,
    fs: LocalFs,
}

impl ProjectContext {
    pub fn new(root: &Path, config: &Path) -> Self {
        let fs = LocalFs::new(root);
        Self {
            root: root.to_path_buf(),
            config: relative_to_root(fs.root(), config),
            fs,
        }
    }

    pub fn fs(&self) -> &LocalFs {
        &self.fs
    }

    /// Commands run from the project root.
    pub fn runner(&self) -> ShellRunner {
        ShellRunner::new(&self.root)
    }

    pub fn config_path(&self) -> &NormalizedPath {
        &self.config
    }

    pub fn has_config(&self) -> bool {
        self.fs.exists(&self.config)
    }

    /// Load and validate the config, failing before any side effects.
    pub fn load(&self) -> Result<IntentConfig> {
        if !self.config.is_contained() {
            return Err(CliError::usage(
                Code::ConfigInvalid,
                format!(
                    "{} is outside the project root {}",
                    self.config,
                    self.fs.root()
                ),
            ));
        }
        if !self.has_config() {
            return Err(CliError::usage(
                Code::ConfigMissing,
                format!("{} not found", self.config),
            ));
        }
        let packs = PolicyPackRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let config = ConfigLoader::new(&packs, &operators).load(&self.fs, &self.config)?;
        debug!(source = %config.source, python = %config.python_version, "Loaded config");
        Ok(config)
    }
}

/// An absolute `--config` under the root becomes root-relative; any other
/// absolute path is kept as given and rejected by [`ProjectContext::load`].
fn relative_to_root(root: &NormalizedPath, config: &Path) -> NormalizedPath {
    if !config.is_absolute() {
        return NormalizedPath::new(config);
    }
    let resolved = dunce::canonicalize(config)
        .ok()
        .or_else(|| {
            let parent = dunce::canonicalize(config.parent()?).ok()?;
            Some(parent.join(config.file_name()?))
        })
        .unwrap_or_else(|| config.to_path_buf());
    match resolved.strip_prefix(root.to_native()) {
        Ok(relative) => NormalizedPath::new(relative),
        Err(_) => NormalizedPath::new(config),
    }
}
