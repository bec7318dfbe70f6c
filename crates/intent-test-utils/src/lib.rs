//! Shared test utilities for the intent workspace.
//!
//! This crate provides deterministic collaborators and project fixtures so
//! crate test suites never depend on the developer's machine. It is a
//! dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`memory`]: [`MemoryFs`], an in-memory [`intent_fs::Filesystem`]
//! - [`runner`]: [`ScriptedRunner`], a call-recording [`intent_checks::CommandRunner`]
//! - [`project`]: [`TestProject`] temp-dir builder for end-to-end tests

pub mod memory;
pub mod project;
pub mod runner;

pub use memory::MemoryFs;
pub use project::TestProject;
pub use runner::ScriptedRunner;
