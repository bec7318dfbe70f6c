//! Version model and configuration for intent
//!
//! - [`version`]: version tuples, constraint sets and the cross-check contract
//! - [`loader`]: fail-fast validation of `intent.toml` into [`IntentConfig`]
//! - [`registry`]: policy packs and the assertion operator whitelist
//! - [`codes`]: stable machine codes used in every report

pub mod codes;
pub mod error;
pub mod json_path;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod version;

pub use codes::Code;
pub use error::{Error, Result};
pub use json_path::{JsonPath, PathSegment};
pub use loader::{ConfigLoader, DEFAULT_SOURCE, toml_to_json};
pub use registry::{OperatorTable, PackDefaults, PolicyPackRegistry};
pub use schema::*;
pub use version::{ConstraintSet, CrossCheck, Satisfaction, VersionTuple};
