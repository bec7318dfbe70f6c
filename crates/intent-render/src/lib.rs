//! Rendering of tool-owned files for intent
//!
//! Both renderers are pure functions of an [`IntentConfig`]: the same config
//! always yields byte-identical output, and every output starts with the
//! [`GENERATED_MARKER`] line followed by the [`BANNER`].

pub mod ci;
pub mod just;

use intent_fs::ManagedPath;
use intent_meta::IntentConfig;

pub use ci::render_ci;
pub use just::render_just;

/// First line of every generated file; its presence marks tool ownership.
pub const GENERATED_MARKER: &str = "# @generated by intent";

/// Second line of every generated file.
pub const BANNER: &str = "# DO NOT EDIT";

/// Whether `content` carries the ownership marker anywhere.
pub fn is_generated(content: &str) -> bool {
    content.contains(GENERATED_MARKER)
}

/// A generated file the tool owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    Ci,
    Just,
}

impl Target {
    /// All targets, in the order commands report them.
    pub const ALL: [Target; 2] = [Target::Ci, Target::Just];

    pub fn path(&self) -> ManagedPath {
        match self {
            Self::Ci => ManagedPath::CiWorkflow,
            Self::Just => ManagedPath::Justfile,
        }
    }

    pub fn render(&self, config: &IntentConfig) -> String {
        match self {
            Self::Ci => render_ci(config),
            Self::Just => render_just(config),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path().as_str())
    }
}

/// Join rendered lines, dropping trailing blank lines and ending with one newline.
pub(crate) fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_generated_detects_marker_anywhere() {
        assert!(is_generated("# @generated by intent\n# DO NOT EDIT\n"));
        assert!(is_generated("name: CI\n# @generated by intent\n"));
        assert!(!is_generated("name: CI\non: [push]\n"));
    }

    #[test]
    fn test_target_paths() {
        assert_eq!(Target::Ci.path().as_str(), ".github/workflows/ci.yml");
        assert_eq!(Target::Just.path().as_str(), "justfile");
        assert_eq!(Target::Ci.to_string(), ".github/workflows/ci.yml");
    }

    #[test]
    fn test_finish_trims_trailing_blank_lines() {
        let out = finish(vec!["a".into(), "".into(), "".into()]);
        assert_eq!(out, "a\n");
    }
}
