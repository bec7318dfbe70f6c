//! Stable machine codes attached to every finding.

use serde::{Serialize, Serializer};

/// A stable `INTENTnnn` identifier.
///
/// Codes are part of the JSON report contract; never renumber a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Code {
    ConfigInvalid,
    ConfigMissing,
    ExclusiveFlags,
    InitExists,

    VersionOk,
    VersionMismatch,
    VersionUnsupported,
    VersionBroader,
    VersionSkipped,
    VersionInvalid,

    FileUpToDate,
    FileMissing,
    FileUnowned,
    FileOutOfDate,
    FileOwnership,

    HookOk,
    HookNonZero,
    HookError,

    CheckPass,
    AssertionFailed,
    CommandFailed,
    PathUnresolved,
    IncompatibleTypes,
    GateFailed,
    BaselineUnavailable,

    WorkflowLint,

    ReconcileAligned,
    ReconcileDrift,
    ReconcileMissing,
    ReconcileSkipped,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigInvalid => "INTENT001",
            Self::ConfigMissing => "INTENT002",
            Self::ExclusiveFlags => "INTENT003",
            Self::InitExists => "INTENT005",
            Self::VersionOk => "INTENT100",
            Self::VersionMismatch => "INTENT101",
            Self::VersionUnsupported => "INTENT102",
            Self::VersionBroader => "INTENT103",
            Self::VersionSkipped => "INTENT104",
            Self::VersionInvalid => "INTENT105",
            Self::FileUpToDate => "INTENT200",
            Self::FileMissing => "INTENT201",
            Self::FileUnowned => "INTENT202",
            Self::FileOutOfDate => "INTENT203",
            Self::FileOwnership => "INTENT204",
            Self::HookOk => "INTENT300",
            Self::HookNonZero => "INTENT301",
            Self::HookError => "INTENT302",
            Self::CheckPass => "INTENT400",
            Self::AssertionFailed => "INTENT401",
            Self::CommandFailed => "INTENT402",
            Self::PathUnresolved => "INTENT403",
            Self::IncompatibleTypes => "INTENT404",
            Self::GateFailed => "INTENT405",
            Self::BaselineUnavailable => "INTENT406",
            Self::WorkflowLint => "INTENT501",
            Self::ReconcileAligned => "INTENT600",
            Self::ReconcileDrift => "INTENT601",
            Self::ReconcileMissing => "INTENT602",
            Self::ReconcileSkipped => "INTENT603",
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
