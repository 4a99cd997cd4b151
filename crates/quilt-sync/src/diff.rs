//! Clock arithmetic over the replicated stores.

use tracing::debug;

use quilt_graph::ChangeSetGraph;
use quilt_log::ChangeLog;
use quilt_store::SnapshotStore;

use crate::error::SyncResult;
use crate::types::{
    SyncRows, VectorClock, TABLE_CHANGES, TABLE_CHANGE_SETS, TABLE_EDGES, TABLE_ELEMENTS,
    TABLE_SNAPSHOTS,
};

/// The local clock: current insertion positions of every replicated table.
pub fn local_clock(store: &SnapshotStore, log: &ChangeLog, graph: &ChangeSetGraph) -> VectorClock {
    let mut clock = VectorClock::new();
    clock.set(TABLE_SNAPSHOTS, store.position());
    clock.set(TABLE_CHANGES, log.position());
    let (sets, elements, edges) = graph.positions();
    clock.set(TABLE_CHANGE_SETS, sets);
    clock.set(TABLE_ELEMENTS, elements);
    clock.set(TABLE_EDGES, edges);
    clock
}

/// Every row past the given clock, per table.
pub fn rows_since(
    clock: &VectorClock,
    store: &SnapshotStore,
    log: &ChangeLog,
    graph: &ChangeSetGraph,
) -> SyncRows {
    SyncRows {
        snapshots: store.rows_from(clock.get(TABLE_SNAPSHOTS)),
        changes: log.rows_from(clock.get(TABLE_CHANGES)),
        change_sets: graph.set_rows_from(clock.get(TABLE_CHANGE_SETS)),
        elements: graph.element_rows_from(clock.get(TABLE_ELEMENTS)),
        edges: graph.edge_rows_from(clock.get(TABLE_EDGES)),
    }
}

/// Outcome of applying received rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub inserted: usize,
    pub skipped: usize,
}

impl ApplyStats {
    fn record(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Apply received rows in dependency order: snapshots before the changes
/// that reference them, change sets before their elements and edges.
///
/// Rows that already exist locally are skipped, so applying the same batch
/// twice is harmless. An edge that would close a cycle aborts the apply;
/// that only happens with a corrupt peer.
pub fn apply_rows(
    rows: SyncRows,
    store: &mut SnapshotStore,
    log: &mut ChangeLog,
    graph: &mut ChangeSetGraph,
) -> SyncResult<ApplyStats> {
    let mut stats = ApplyStats::default();
    for row in rows.snapshots {
        stats.record(store.insert_row(row));
    }
    for change in rows.changes {
        stats.record(log.insert_row(change));
    }
    for set in rows.change_sets {
        stats.record(graph.insert_set_row(set));
    }
    for element in rows.elements {
        stats.record(graph.insert_element_row(element));
    }
    for edge in rows.edges {
        stats.record(graph.insert_edge_row(edge)?);
    }
    debug!(
        inserted = stats.inserted,
        skipped = stats.skipped,
        "applied sync rows"
    );
    Ok(stats)
}
