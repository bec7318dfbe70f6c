//! Check engine for intent
//!
//! Runs every command referenced by assertions, gates and summary metrics
//! exactly once, then evaluates each item against the memoized JSON payloads.
//!
//! - [`runner`]: the [`CommandRunner`] collaborator and the shell-backed [`ShellRunner`]
//! - [`command`]: per-run memoization of command results
//! - [`json_path`]: path resolution over JSON payloads
//! - [`assertion`], [`gate`], [`metric`]: item evaluation
//! - [`summary`]: condensed markdown report

pub mod assertion;
pub mod command;
pub mod engine;
pub mod error;
pub mod gate;
pub mod json_path;
pub mod metric;
pub mod outcome;
pub mod runner;
pub mod summary;

pub use command::{CommandCache, CommandResult};
pub use engine::{CheckEngine, CheckRun};
pub use error::{Error, Result};
pub use outcome::{CheckItem, MetricItem};
pub use runner::{CommandOutput, CommandRunner, ShellRunner};
