//! [`TestProject`] builder for end-to-end scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use intent_fs::LocalFs;
use tempfile::TempDir;

/// A temporary project directory with helpers for setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use intent_test_utils::TestProject;
///
/// let project = TestProject::new().with_intent("[python]\nversion = \"3.12\"\n");
/// project.assert_file_exists("intent.toml");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `intent.toml`.
    pub fn with_intent(self, content: &str) -> Self {
        self.write("intent.toml", content);
        self
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("TestProject::read: {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// A [`LocalFs`] rooted at the project.
    pub fn fs(&self) -> LocalFs {
        LocalFs::new(self.root())
    }

    pub fn assert_file_exists(&self, rel: &str) {
        assert!(self.exists(rel), "expected file to exist: {rel}");
    }

    pub fn assert_file_missing(&self, rel: &str) {
        assert!(!self.exists(rel), "expected file to be absent: {rel}");
    }

    pub fn assert_file_contains(&self, rel: &str, needle: &str) {
        let content = self.read(rel);
        assert!(
            content.contains(needle),
            "expected {rel} to contain {needle:?}, got:\n{content}"
        );
    }
}
