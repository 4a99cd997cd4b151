use std::sync::Arc;

use tracing::debug;

use quilt_graph::ChangeSetGraph;
use quilt_log::ChangeLog;
use quilt_store::SnapshotStore;

use crate::diff::{apply_rows, local_clock, rows_since, ApplyStats};
use crate::error::SyncResult;
use crate::transport::SyncTransport;
use crate::types::VectorClock;

/// Client side of one store's sync relationship.
///
/// Tracks the remote clock as last acknowledged, so a push only resends
/// rows the remote has not confirmed. The remote deduplicates anyway; the
/// tracked clock is bandwidth, not correctness.
pub struct SyncClient {
    transport: Arc<dyn SyncTransport>,
    store_name: String,
    remote_clock: VectorClock,
}

impl SyncClient {
    pub fn new(transport: Arc<dyn SyncTransport>, store_name: impl Into<String>) -> Self {
        Self {
            transport,
            store_name: store_name.into(),
            remote_clock: VectorClock::new(),
        }
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// The remote clock as of the last exchange.
    pub fn remote_clock(&self) -> &VectorClock {
        &self.remote_clock
    }

    /// Pull remote rows into the local stores.
    pub async fn pull(
        &mut self,
        store: &mut SnapshotStore,
        log: &mut ChangeLog,
        graph: &mut ChangeSetGraph,
    ) -> SyncResult<ApplyStats> {
        let clock = local_clock(store, log, graph);
        let (rows, remote_clock) = self.transport.pull(&self.store_name, &clock).await?;
        debug!(store = %self.store_name, rows = rows.len(), "pulled rows");
        let stats = apply_rows(rows, store, log, graph)?;
        self.remote_clock.merge_max(&remote_clock);
        Ok(stats)
    }

    /// Push local rows the remote has not acknowledged.
    pub async fn push(
        &mut self,
        store: &SnapshotStore,
        log: &ChangeLog,
        graph: &ChangeSetGraph,
    ) -> SyncResult<()> {
        let rows = rows_since(&self.remote_clock, store, log, graph);
        if rows.is_empty() {
            return Ok(());
        }
        debug!(store = %self.store_name, rows = rows.len(), "pushing rows");
        self.transport.push(&self.store_name, &rows).await?;
        self.remote_clock.merge_max(&local_clock(store, log, graph));
        Ok(())
    }
}
