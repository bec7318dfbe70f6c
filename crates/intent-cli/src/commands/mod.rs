//! Command implementations

mod check;
mod doctor;
mod init;
mod lint;
mod reconcile;
mod show;
mod sync;

pub use check::run_check;
pub use doctor::run_doctor;
pub use init::run_init;
pub use lint::run_lint_workflow;
pub use reconcile::run_reconcile;
pub use show::run_show;
pub use sync::{SyncArgs, run_sync};

use crate::error::CliError;

/// Machine-readable form of an error for `--format json`.
pub(crate) fn json_error(err: &CliError) -> serde_json::Value {
    serde_json::json!({
        "ok": false,
        "code": err.code().map(|c| c.as_str()),
        "message": err.to_string(),
    })
}
