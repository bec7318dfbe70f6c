//! Filesystem collaborator for intent
//!
//! Provides normalized project-relative paths, atomic locked writes and the
//! narrow [`Filesystem`] interface the rest of the workspace consumes.

pub mod constants;
pub mod error;
pub mod filesystem;
pub mod io;
pub mod path;

pub use constants::ManagedPath;
pub use error::{Error, Result};
pub use filesystem::{Filesystem, LocalFs};
pub use path::NormalizedPath;
