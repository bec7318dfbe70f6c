//! The `intent check` report payload.

use intent_checks::{CheckItem, CheckRun, MetricItem};
use serde::Serialize;

use crate::drift::FileReport;
use crate::plugins::HookResult;
use crate::versions::VersionReport;

/// Summary section of the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub summary_enabled: bool,
    pub summary_markdown: Option<String>,
    pub metrics: Vec<MetricItem>,
}

/// Everything `intent check` found, serialized as the JSON report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub ok: bool,
    pub versions: VersionReport,
    pub files: Vec<FileReport>,
    pub plugins: Vec<HookResult>,
    pub checks: Vec<CheckItem>,
    pub report: SummaryReport,
}

impl CheckReport {
    /// Assemble the payload; `ok` holds only when every section passed.
    pub fn new(
        versions: VersionReport,
        files: Vec<FileReport>,
        plugins: Vec<HookResult>,
        run: CheckRun,
    ) -> Self {
        let ok = versions.ok
            && files.iter().all(|f| f.ok)
            && plugins.iter().all(|p| p.ok)
            && run.ok();
        Self {
            ok,
            versions,
            files,
            plugins,
            checks: run.checks,
            report: SummaryReport {
                summary_enabled: run.summary_enabled,
                summary_markdown: run.summary_markdown,
                metrics: run.metrics,
            },
        }
    }

    /// Whether any generated file needs `intent sync --write`.
    pub fn has_file_drift(&self) -> bool {
        self.files.iter().any(|f| !f.ok)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
