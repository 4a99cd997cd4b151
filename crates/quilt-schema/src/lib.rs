//! Versioned schema registry for Quilt.
//!
//! Schemas are data: JSON definitions keyed by `(key, version)`. A key and
//! version, once registered, is an append-only identity — re-registering the
//! same pair with a structurally different definition fails with
//! [`SchemaError::SchemaConflict`]. Breaking changes require a version bump.
//!
//! Every change admitted to the change log is validated against its schema
//! first; content that does not conform is rejected before any row is
//! written.

pub mod error;
pub mod registry;
pub mod validate;

pub use error::{SchemaError, SchemaResult};
pub use registry::{SchemaRegistry, StoredSchema};
pub use validate::validate_value;
