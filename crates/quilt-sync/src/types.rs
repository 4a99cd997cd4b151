use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use quilt_graph::{ChangeSet, ChangeSetEdge, ChangeSetElement};
use quilt_log::Change;
use quilt_store::SnapshotRow;

pub const TABLE_SNAPSHOTS: &str = "snapshot";
pub const TABLE_CHANGES: &str = "change";
pub const TABLE_CHANGE_SETS: &str = "change_set";
pub const TABLE_ELEMENTS: &str = "change_set_element";
pub const TABLE_EDGES: &str = "change_set_edge";

/// Per-table sync positions. A missing table reads as position zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    positions: BTreeMap<String, u64>,
}

impl VectorClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, table: &str) -> u64 {
        self.positions.get(table).copied().unwrap_or(0)
    }

    pub fn set(&mut self, table: &str, position: u64) {
        self.positions.insert(table.to_string(), position);
    }

    /// Take the per-table maximum of two clocks.
    pub fn merge_max(&mut self, other: &VectorClock) {
        for (table, position) in &other.positions {
            let entry = self.positions.entry(table.clone()).or_insert(0);
            *entry = (*entry).max(*position);
        }
    }

    /// Returns `true` if every position in `self` is at least the matching
    /// position in `other`.
    pub fn covers(&self, other: &VectorClock) -> bool {
        other
            .positions
            .iter()
            .all(|(table, position)| self.get(table) >= *position)
    }
}

/// Rows exchanged in one sync exchange, grouped by table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRows {
    pub snapshots: Vec<SnapshotRow>,
    pub changes: Vec<Change>,
    pub change_sets: Vec<ChangeSet>,
    pub elements: Vec<ChangeSetElement>,
    pub edges: Vec<ChangeSetEdge>,
}

impl SyncRows {
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
            && self.changes.is_empty()
            && self.change_sets.is_empty()
            && self.elements.is_empty()
            && self.edges.is_empty()
    }

    /// Total row count across all tables.
    pub fn len(&self) -> usize {
        self.snapshots.len()
            + self.changes.len()
            + self.change_sets.len()
            + self.elements.len()
            + self.edges.len()
    }
}
