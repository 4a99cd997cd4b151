//! Foundation types for Quilt, the embedded change-control engine.
//!
//! This crate provides the identifier, temporal, and cancellation types used
//! throughout the Quilt workspace. Every other `quilt-*` crate depends on it.
//!
//! # Key Types
//!
//! - [`SnapshotId`] — Content-addressed identifier (BLAKE3 over canonical JSON)
//! - [`ChangeId`], [`ChangeSetId`], [`VersionId`] — UUID v7 row identifiers
//! - [`Timestamp`] — UTC wall-clock timestamp attached to change rows
//! - [`CancelToken`] — cooperative cancellation for long traversals

pub mod cancel;
pub mod error;
pub mod ids;
pub mod time;

pub use cancel::CancelToken;
pub use error::TypeError;
pub use ids::{ChangeId, ChangeSetId, SnapshotId, VersionId};
pub use time::Timestamp;
