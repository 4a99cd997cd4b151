//! Canonical JSON serialization.
//!
//! Two structurally equal JSON values must hash to the same [`SnapshotId`]
//! regardless of the key order they arrived in. `serde_json`'s `Map` keeps
//! object keys in sorted order (the `preserve_order` feature is not
//! enabled), so serializing a parsed [`Value`] compactly yields a canonical
//! byte string at every nesting level.

use quilt_types::SnapshotId;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Serialize a JSON value to its canonical compact byte form.
pub fn canonical_bytes(value: &Value) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// The content-addressed id of a JSON value.
pub fn canonical_id(value: &Value) -> StoreResult<SnapshotId> {
    Ok(SnapshotId::from_content(&canonical_bytes(value)?))
}
