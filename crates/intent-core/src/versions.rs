//! Cross-check of the declared version against `requires-python`.

use intent_meta::Code;
use intent_meta::version::{CrossCheck, cross_check};
use intent_meta::IntentConfig;
use serde::Serialize;

use crate::pyproject::PyprojectStatus;

/// Outcome of the version cross-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionReport {
    pub ok: bool,
    pub message: String,
    pub code: Code,
}

impl VersionReport {
    fn pass(code: Code, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            code,
        }
    }

    fn note(code: Code, message: impl AsRef<str>) -> Self {
        Self::pass(code, format!("note: {}", message.as_ref()))
    }

    fn fail(code: Code, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            code,
        }
    }

    /// Passing, but only informational.
    pub fn is_note(&self) -> bool {
        self.ok && self.message.starts_with("note:")
    }
}

/// Compare the declared version with the manifest status.
///
/// Under `strict`, unsupported specs, invalid manifests and broader
/// ranges fail instead of producing notes.
pub fn check_versions(config: &IntentConfig, status: &PyprojectStatus, strict: bool) -> VersionReport {
    let declared = &config.python_version;
    let spec = match status {
        PyprojectStatus::FileMissing => {
            return VersionReport::note(
                Code::VersionSkipped,
                "pyproject.toml not found; version cross-check skipped",
            );
        }
        PyprojectStatus::ProjectMissing => {
            return VersionReport::note(
                Code::VersionSkipped,
                "pyproject.toml has no [project] table; version cross-check skipped",
            );
        }
        PyprojectStatus::RequiresPythonMissing => {
            return VersionReport::note(
                Code::VersionSkipped,
                "[project].requires-python not set; version cross-check skipped",
            );
        }
        PyprojectStatus::Invalid(_) if strict => {
            return VersionReport::fail(
                Code::VersionInvalid,
                "invalid requires-python value in pyproject.toml",
            );
        }
        PyprojectStatus::Invalid(_) => {
            return VersionReport::note(
                Code::VersionInvalid,
                "invalid requires-python value; version cross-check skipped",
            );
        }
        PyprojectStatus::Ok(spec) => spec.as_str(),
    };

    let bare = !spec.contains(['<', '>', ',', '=', '~', '!']);
    match cross_check(&config.python, spec) {
        CrossCheck::Match if bare => VersionReport::pass(
            Code::VersionOk,
            format!("pyproject requires_python matches intent ({spec})"),
        ),
        CrossCheck::Match => VersionReport::pass(
            Code::VersionOk,
            format!("Version ok (range): intent {declared} satisfies {spec}"),
        ),
        CrossCheck::Mismatch if bare => VersionReport::fail(
            Code::VersionMismatch,
            format!("Version mismatch (simple spec): intent={declared} vs pyproject={spec}"),
        ),
        CrossCheck::Mismatch => VersionReport::fail(
            Code::VersionMismatch,
            format!("Version mismatch (range): intent {declared} does not satisfy {spec}"),
        ),
        CrossCheck::Unsupported if strict => VersionReport::fail(
            Code::VersionUnsupported,
            format!("Unsupported requires_python spec (strict): {spec}"),
        ),
        CrossCheck::Unsupported => VersionReport::note(
            Code::VersionUnsupported,
            format!("Unsupported requires_python spec (skipping): {spec}"),
        ),
        CrossCheck::Broader { .. } => {
            let message = format!(
                "pyproject requires_python ({spec}) is broader than intent ({declared}); \
                 consider tightening pyproject to match intent"
            );
            if strict {
                VersionReport::fail(Code::VersionBroader, message)
            } else {
                VersionReport::note(Code::VersionBroader, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn config() -> IntentConfig {
        IntentConfig::minimal("3.12", [("test", "pytest -q")]).unwrap()
    }

    fn spec(s: &str) -> PyprojectStatus {
        PyprojectStatus::Ok(s.to_string())
    }

    #[rstest]
    #[case(">=3.12,<3.13", true, "Version ok (range): intent 3.12 satisfies >=3.12,<3.13")]
    #[case("3.12", true, "pyproject requires_python matches intent (3.12)")]
    #[case("3.11", false, "Version mismatch (simple spec): intent=3.12 vs pyproject=3.11")]
    #[case(">=3.13", false, "Version mismatch (range): intent 3.12 does not satisfy >=3.13")]
    #[case("~=3.12", true, "Version ok (range): intent 3.12 satisfies ~=3.12")]
    fn test_check_versions(#[case] s: &str, #[case] ok: bool, #[case] message: &str) {
        let report = check_versions(&config(), &spec(s), false);
        assert_eq!(report.ok, ok);
        assert_eq!(report.message, message);
    }

    #[test]
    fn test_broader_range_is_note_unless_strict() {
        let lenient = check_versions(&config(), &spec(">=3.11,<3.13"), false);
        assert!(lenient.ok);
        assert!(lenient.is_note());
        assert_eq!(lenient.code, Code::VersionBroader);
        assert!(lenient.message.contains("is broader than intent (3.12)"));

        let strict = check_versions(&config(), &spec(">=3.11,<3.13"), true);
        assert!(!strict.ok);
        assert!(strict.message.starts_with("pyproject requires_python (>=3.11,<3.13)"));
    }

    #[test]
    fn test_unsupported_spec_is_note_unless_strict() {
        let lenient = check_versions(&config(), &spec(">=3.12,!=3.12.1"), false);
        assert_eq!(
            lenient.message,
            "note: Unsupported requires_python spec (skipping): >=3.12,!=3.12.1"
        );
        let strict = check_versions(&config(), &spec(">=3.12,!=3.12.1"), true);
        assert!(!strict.ok);
        assert_eq!(
            strict.message,
            "Unsupported requires_python spec (strict): >=3.12,!=3.12.1"
        );
    }

    #[rstest]
    #[case(PyprojectStatus::FileMissing, "note: pyproject.toml not found; version cross-check skipped")]
    #[case(
        PyprojectStatus::ProjectMissing,
        "note: pyproject.toml has no [project] table; version cross-check skipped"
    )]
    #[case(
        PyprojectStatus::RequiresPythonMissing,
        "note: [project].requires-python not set; version cross-check skipped"
    )]
    fn test_skipped_statuses(#[case] status: PyprojectStatus, #[case] message: &str) {
        let report = check_versions(&config(), &status, true);
        assert!(report.ok);
        assert_eq!(report.code, Code::VersionSkipped);
        assert_eq!(report.message, message);
    }

    #[test]
    fn test_invalid_manifest_fails_only_when_strict() {
        let status = PyprojectStatus::Invalid("bad".into());
        assert!(check_versions(&config(), &status, false).ok);
        assert!(!check_versions(&config(), &status, true).ok);
    }
}
