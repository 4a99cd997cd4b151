use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use quilt_types::SnapshotId;

use crate::canonical::canonical_bytes;
use crate::error::{StoreError, StoreResult};

/// One snapshot row as exchanged over sync: id plus canonical bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub id: SnapshotId,
    pub content: Vec<u8>,
}

/// Content-addressed snapshot store.
///
/// Invariants:
/// - Snapshots are immutable once written; the same content always maps to
///   the same id, so `write` is idempotent and duplicate-free.
/// - The no-content sentinel is never backed by a row.
/// - Rows are only removed by external compaction, never by the engine.
///
/// The store is a plain value object: callers serialize access through the
/// engine's write mutex, and the whole store clones cheaply enough to act
/// as a transaction working copy.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SnapshotStore {
    rows: BTreeMap<SnapshotId, Vec<u8>>,
    /// Insertion order, used to answer positional sync diffs.
    order: Vec<SnapshotId>,
}

impl SnapshotStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshot rows. The sentinel is never counted.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the store has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write a value and return its content-addressed id.
    ///
    /// `None` resolves to the no-content sentinel without storing anything.
    /// Writing identical content twice is a no-op returning the same id, so
    /// two writers racing on the same content converge on one row.
    pub fn write(&mut self, content: Option<&Value>) -> StoreResult<SnapshotId> {
        let Some(value) = content else {
            return Ok(SnapshotId::no_content());
        };
        let bytes = canonical_bytes(value)?;
        let id = SnapshotId::from_content(&bytes);
        if !self.rows.contains_key(&id) {
            debug!(snapshot = %id.short_hex(), bytes = bytes.len(), "stored snapshot");
            self.rows.insert(id, bytes);
            self.order.push(id);
        }
        Ok(id)
    }

    /// Read a snapshot's content by id.
    ///
    /// The sentinel reads as `Ok(None)` (the entity was deleted). Unknown
    /// ids are an error: every non-sentinel id referenced by a change must
    /// resolve.
    pub fn read(&self, id: &SnapshotId) -> StoreResult<Option<Value>> {
        if id.is_no_content() {
            return Ok(None);
        }
        let bytes = self.rows.get(id).ok_or(StoreError::NotFound(*id))?;
        let value = serde_json::from_slice(bytes).map_err(|e| StoreError::CorruptSnapshot {
            id: *id,
            reason: e.to_string(),
        })?;
        Ok(Some(value))
    }

    /// Check whether an id resolves (the sentinel always does).
    pub fn contains(&self, id: &SnapshotId) -> bool {
        id.is_no_content() || self.rows.contains_key(id)
    }

    /// Rows at insertion positions `>= from`, for sync diffs.
    pub fn rows_from(&self, from: u64) -> Vec<SnapshotRow> {
        self.order
            .iter()
            .skip(from as usize)
            .map(|id| SnapshotRow {
                id: *id,
                content: self.rows[id].clone(),
            })
            .collect()
    }

    /// Current sync position (number of rows ever inserted).
    pub fn position(&self) -> u64 {
        self.order.len() as u64
    }

    /// Insert a row received over sync.
    ///
    /// Rows whose id already exists are silently skipped (first-writer-wins
    /// at row identity; content addressing guarantees the bytes match).
    /// Returns `true` if the row was inserted.
    pub fn insert_row(&mut self, row: SnapshotRow) -> bool {
        if row.id.is_no_content() || self.rows.contains_key(&row.id) {
            return false;
        }
        self.order.push(row.id);
        self.rows.insert(row.id, row.content);
        true
    }
}
