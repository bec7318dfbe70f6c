//! Orchestration of `sync` and `check`
//!
//! The [`IntentEngine`] binds a [`Filesystem`] and a [`CommandRunner`] to a
//! loaded [`IntentConfig`]. It never parses arguments or prints; the binary
//! owns presentation.

use intent_checks::{CheckEngine, CommandRunner};
use intent_fs::{Filesystem, NormalizedPath};
use intent_meta::IntentConfig;
use intent_render::Target;
use serde_json::Value;
use tracing::{debug, info};

use crate::drift::detect_all;
use crate::error::Result;
use crate::generated::{WriteMode, WriteOutcome, preview, write_generated};
use crate::plugins::{HookRun, HookStage, run_hooks};
use crate::pyproject::read_requires_python;
use crate::report::CheckReport;
use crate::versions::check_versions;

/// Outcome of `sync --write`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Each generated target and what happened to it, in render order
    pub written: Vec<(NormalizedPath, WriteOutcome)>,
    /// `[plugins].generate` hooks run after the writes
    pub hooks: HookRun,
}

impl SyncReport {
    pub fn ok(&self) -> bool {
        self.hooks.ok()
    }
}

/// Engine for keeping a project consistent with its `intent.toml`.
pub struct IntentEngine<'a> {
    fs: &'a dyn Filesystem,
    runner: &'a dyn CommandRunner,
}

impl<'a> IntentEngine<'a> {
    pub fn new(fs: &'a dyn Filesystem, runner: &'a dyn CommandRunner) -> Self {
        Self { fs, runner }
    }

    /// Dry-run status line per generated target.
    pub fn preview(&self, config: &IntentConfig) -> Result<Vec<String>> {
        Target::ALL
            .iter()
            .map(|target| preview(self.fs, &target.path().path(), &target.render(config)))
            .collect()
    }

    /// Write every generated target, then run the generate hooks.
    ///
    /// An ownership refusal stops the sync; targets written before it stay
    /// written and no hooks run.
    pub fn sync(&self, config: &IntentConfig, mode: WriteMode) -> Result<SyncReport> {
        let mut written = Vec::with_capacity(Target::ALL.len());
        for target in Target::ALL {
            let path = target.path().path();
            let outcome = write_generated(self.fs, &path, &target.render(config), mode)?;
            written.push((path, outcome));
        }

        let hooks = run_hooks(self.runner, config, HookStage::Generate);
        info!(
            changed = written.iter().filter(|(_, o)| o.changed()).count(),
            hooks = hooks.results.len(),
            "Sync complete"
        );
        Ok(SyncReport { written, hooks })
    }

    /// Version cross-check, file drift, check hooks and structured checks.
    ///
    /// `strict` is combined with the config's resolved policy.
    pub fn check(&self, config: &IntentConfig, strict: bool) -> Result<CheckReport> {
        let strict = strict || config.policy.strict;
        let status = read_requires_python(self.fs)?;
        let versions = check_versions(config, &status, strict);
        debug!(code = %versions.code, "Version cross-check");

        let files = detect_all(self.fs, config)?;
        let hooks = run_hooks(self.runner, config, HookStage::Check);
        let run = CheckEngine::new(self.runner).run(config, self.baseline_file(config));

        Ok(CheckReport::new(versions, files, hooks.results, run))
    }

    /// Parsed `[ci.summary].baseline_file`, when the summary uses one.
    fn baseline_file(&self, config: &IntentConfig) -> Option<std::result::Result<Value, String>> {
        let summary = config.ci.summary.as_ref().filter(|s| s.enabled)?;
        let file = summary.baseline_file.as_deref()?;
        let path = NormalizedPath::new(file);

        Some(match self.fs.read_optional(&path) {
            Ok(Some(text)) => serde_json::from_str(&text)
                .map_err(|e| format!("baseline file '{file}' is not valid JSON: {e}")),
            Ok(None) => Err(format!("baseline file '{file}' not found")),
            Err(e) => Err(format!("baseline file '{file}' could not be read: {e}")),
        })
    }
}
