//! Content-addressed snapshot storage for Quilt.
//!
//! Snapshots are immutable value payloads addressed by the BLAKE3 hash of
//! their canonical JSON serialization. Writing the same value twice is a
//! no-op that returns the same [`SnapshotId`]; deleting an entity is
//! represented by the reserved no-content sentinel rather than row removal.

pub mod canonical;
pub mod error;
pub mod store;

pub use canonical::{canonical_bytes, canonical_id};
pub use error::{StoreError, StoreResult};
pub use store::{SnapshotRow, SnapshotStore};
