//! In-memory filesystem.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io;

use intent_fs::{Error, Filesystem, NormalizedPath, Result};

/// A [`Filesystem`] backed by a map, counting writes.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: RefCell<BTreeMap<NormalizedPath, String>>,
    writes: Cell<usize>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without counting it as a write.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(NormalizedPath::new(path), content.to_string());
        self
    }

    pub fn read(&self, path: &NormalizedPath) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    /// Number of `write_text` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files.borrow().keys().map(|p| p.to_string()).collect()
    }
}

impl Filesystem for MemoryFs {
    fn exists(&self, path: &NormalizedPath) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn read_text(&self, path: &NormalizedPath) -> Result<String> {
        self.read(path).ok_or_else(|| {
            Error::io(
                path.to_native(),
                io::Error::new(io::ErrorKind::NotFound, "no such file"),
            )
        })
    }

    fn write_text(&self, path: &NormalizedPath, content: &str) -> Result<()> {
        self.writes.set(self.writes.get() + 1);
        self.files
            .borrow_mut()
            .insert(path.clone(), content.to_string());
        Ok(())
    }
}
