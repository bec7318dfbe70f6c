//! Core orchestration layer for intent
//!
//! This crate sits between the config model and the binary, implementing:
//!
//! - **Ownership gate**: marker-based protection for generated files ([`generated`])
//! - **Drift detection**: expected vs. on-disk state per generated file ([`drift`])
//! - **Version cross-check**: declared version against `requires-python` ([`versions`])
//! - **Reconciler**: plan/apply alignment of version pin files ([`reconcile`])
//! - **Plugin hooks** and **workflow lint** ([`plugins`], [`lint`])
//! - **IntentEngine**: `sync` and `check` orchestration producing the JSON report
//!
//! ```text
//!                      intent-cli
//!                          |
//!                     intent-core
//!                          |
//!     +-----------+--------+--------+------------+
//!     |           |                 |            |
//! intent-fs  intent-meta     intent-render  intent-checks
//! ```

pub mod drift;
pub mod engine;
pub mod error;
pub mod generated;
pub mod lint;
pub mod plugins;
pub mod pyproject;
pub mod reconcile;
pub mod report;
pub mod versions;

pub use drift::{FileReport, FileState, detect_all};
pub use engine::{IntentEngine, SyncReport};
pub use error::{Error, Result};
pub use generated::{WriteMode, WriteOutcome, write_generated};
pub use lint::{LintFinding, lint_workflow};
pub use plugins::{HookResult, HookRun, HookStage};
pub use pyproject::{PyprojectStatus, read_requires_python};
pub use reconcile::{ApplyOutcome, ApplyReport, PinFile, PinPlan, PinStatus, ReconcilePlan};
pub use report::CheckReport;
pub use versions::{VersionReport, check_versions};
