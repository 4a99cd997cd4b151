//! Version pointers for Quilt.
//!
//! A [`Version`] is a named, mutable pointer into the change-set graph — a
//! branch. Versions are the only mutable rows in the engine: the pointer is
//! reassigned on every commit, merge, and switch. Deleting a version never
//! deletes the change sets it pointed at.

pub mod error;
pub mod names;
pub mod store;
pub mod types;

pub use error::{RefError, RefResult};
pub use names::validate_version_name;
pub use store::VersionStore;
pub use types::Version;
