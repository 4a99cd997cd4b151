use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use quilt_schema::SchemaRegistry;
use quilt_store::SnapshotStore;
use quilt_types::{ChangeId, Timestamp};

use crate::change::{Change, NewChange};
use crate::error::{LogError, LogResult};

/// The append-only change log.
///
/// Committed changes are immutable and insertion-ordered (the order doubles
/// as the sync position). Newly recorded changes land in a *pending* buffer
/// and only become committed when a change set seals them; discarding the
/// buffer is the rollback path for an aborted commit.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChangeLog {
    committed: Vec<Change>,
    index: BTreeMap<ChangeId, usize>,
    pending: Vec<Change>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed changes.
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Changes recorded but not yet sealed into a change set.
    pub fn pending(&self) -> &[Change] {
        &self.pending
    }

    /// Record a change into the pending buffer.
    ///
    /// The content is validated against the schema registry first (unless
    /// this is a deletion) and its snapshot is written to the store. Fails
    /// with the registry's `UnknownSchema`/`Validation` errors before any
    /// row is touched.
    pub fn record(
        &mut self,
        store: &mut SnapshotStore,
        registry: &SchemaRegistry,
        input: NewChange,
    ) -> LogResult<Change> {
        if let Some(content) = &input.content {
            registry.validate(&input.schema_key, &input.schema_version, content)?;
        }
        if let Some(parent) = &input.parent_id {
            if !self.contains(parent) {
                return Err(LogError::UnknownParentChange(*parent));
            }
        }

        let snapshot_id = store.write(input.content.as_ref())?;
        let change = Change {
            id: ChangeId::new(),
            entity_id: input.entity_id,
            file_id: input.file_id,
            schema_key: input.schema_key,
            schema_version: input.schema_version,
            plugin_key: input.plugin_key,
            snapshot_id,
            parent_id: input.parent_id,
            created_at: Timestamp::now(),
        };
        debug!(
            change = %change.id.short_id(),
            entity = %change.entity_id,
            schema = %change.schema_key,
            "recorded pending change"
        );
        self.pending.push(change.clone());
        Ok(change)
    }

    /// Move every pending change into the committed log and return them.
    ///
    /// Called by the engine at the transactional boundary of a commit: the
    /// returned changes become the new change set's elements.
    pub fn seal_pending(&mut self) -> Vec<Change> {
        let sealed = std::mem::take(&mut self.pending);
        for change in &sealed {
            self.index.insert(change.id, self.committed.len());
            self.committed.push(change.clone());
        }
        sealed
    }

    /// Drop the pending buffer without committing.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// Look up a committed change by id.
    pub fn get(&self, id: &ChangeId) -> LogResult<&Change> {
        self.index
            .get(id)
            .map(|&i| &self.committed[i])
            .ok_or(LogError::UnknownChange(*id))
    }

    /// Returns `true` if `id` is committed or pending.
    pub fn contains(&self, id: &ChangeId) -> bool {
        self.index.contains_key(id) || self.pending.iter().any(|c| c.id == *id)
    }

    /// Iterate over committed changes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.committed.iter()
    }

    /// Committed rows at sync positions `>= from`.
    pub fn rows_from(&self, from: u64) -> Vec<Change> {
        self.committed
            .iter()
            .skip(from as usize)
            .cloned()
            .collect()
    }

    /// Current sync position.
    pub fn position(&self) -> u64 {
        self.committed.len() as u64
    }

    /// Insert a committed row received over sync, skipping existing ids.
    /// Returns `true` if the row was inserted.
    pub fn insert_row(&mut self, change: Change) -> bool {
        if self.index.contains_key(&change.id) {
            return false;
        }
        self.index.insert(change.id, self.committed.len());
        self.committed.push(change);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut r = SchemaRegistry::new();
        r.register(
            "label",
            "1.0",
            &json!({"type": "object", "required": ["text"]}),
        )
        .unwrap();
        r
    }

    fn new_change(entity: &str, content: Option<serde_json::Value>) -> NewChange {
        NewChange {
            entity_id: entity.into(),
            file_id: "file-1".into(),
            schema_key: "label".into(),
            schema_version: "1.0".into(),
            plugin_key: "test-plugin".into(),
            content,
            parent_id: None,
        }
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    #[test]
    fn record_validates_and_snapshots() {
        let mut log = ChangeLog::new();
        let mut store = SnapshotStore::new();
        let change = log
            .record(
                &mut store,
                &registry(),
                new_change("e1", Some(json!({"text": "hello"}))),
            )
            .unwrap();
        assert!(!change.is_deletion());
        assert_eq!(
            store.read(&change.snapshot_id).unwrap(),
            Some(json!({"text": "hello"}))
        );
        assert_eq!(log.pending().len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn record_rejects_nonconforming_content() {
        let mut log = ChangeLog::new();
        let mut store = SnapshotStore::new();
        let err = log
            .record(
                &mut store,
                &registry(),
                new_change("e1", Some(json!({"wrong": true}))),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LogError::Schema(quilt_schema::SchemaError::Validation { .. })
        ));
        assert!(log.pending().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn record_rejects_unknown_schema() {
        let mut log = ChangeLog::new();
        let mut store = SnapshotStore::new();
        let mut input = new_change("e1", Some(json!({"text": "x"})));
        input.schema_key = "ghost".into();
        let err = log.record(&mut store, &registry(), input).unwrap_err();
        assert!(matches!(
            err,
            LogError::Schema(quilt_schema::SchemaError::UnknownSchema { .. })
        ));
    }

    #[test]
    fn deletion_skips_validation_and_uses_sentinel() {
        let mut log = ChangeLog::new();
        let mut store = SnapshotStore::new();
        let change = log
            .record(&mut store, &registry(), new_change("e1", None))
            .unwrap();
        assert!(change.is_deletion());
        assert!(store.is_empty());
    }

    #[test]
    fn record_rejects_dangling_parent() {
        let mut log = ChangeLog::new();
        let mut store = SnapshotStore::new();
        let mut input = new_change("e1", Some(json!({"text": "x"})));
        input.parent_id = Some(ChangeId::new());
        let err = log.record(&mut store, &registry(), input).unwrap_err();
        assert!(matches!(err, LogError::UnknownParentChange(_)));
    }

    #[test]
    fn record_accepts_pending_parent() {
        let mut log = ChangeLog::new();
        let mut store = SnapshotStore::new();
        let first = log
            .record(
                &mut store,
                &registry(),
                new_change("e1", Some(json!({"text": "a"}))),
            )
            .unwrap();
        let mut second = new_change("e1", Some(json!({"text": "b"})));
        second.parent_id = Some(first.id);
        log.record(&mut store, &registry(), second).unwrap();
        assert_eq!(log.pending().len(), 2);
    }

    // -----------------------------------------------------------------------
    // Sealing / discarding
    // -----------------------------------------------------------------------

    #[test]
    fn seal_moves_pending_to_committed() {
        let mut log = ChangeLog::new();
        let mut store = SnapshotStore::new();
        log.record(
            &mut store,
            &registry(),
            new_change("e1", Some(json!({"text": "a"}))),
        )
        .unwrap();
        log.record(
            &mut store,
            &registry(),
            new_change("e2", Some(json!({"text": "b"}))),
        )
        .unwrap();

        let sealed = log.seal_pending();
        assert_eq!(sealed.len(), 2);
        assert!(log.pending().is_empty());
        assert_eq!(log.len(), 2);
        assert_eq!(log.get(&sealed[0].id).unwrap().entity_id, "e1");
    }

    #[test]
    fn discard_drops_pending_only() {
        let mut log = ChangeLog::new();
        let mut store = SnapshotStore::new();
        log.record(
            &mut store,
            &registry(),
            new_change("e1", Some(json!({"text": "a"}))),
        )
        .unwrap();
        log.seal_pending();
        log.record(
            &mut store,
            &registry(),
            new_change("e2", Some(json!({"text": "b"}))),
        )
        .unwrap();

        log.discard_pending();
        assert!(log.pending().is_empty());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn uncommitted_changes_are_not_readable() {
        let mut log = ChangeLog::new();
        let mut store = SnapshotStore::new();
        let change = log
            .record(
                &mut store,
                &registry(),
                new_change("e1", Some(json!({"text": "a"}))),
            )
            .unwrap();
        assert!(matches!(
            log.get(&change.id),
            Err(LogError::UnknownChange(_))
        ));
        log.seal_pending();
        assert!(log.get(&change.id).is_ok());
    }

    // -----------------------------------------------------------------------
    // Sync rows
    // -----------------------------------------------------------------------

    #[test]
    fn rows_from_and_insert_row() {
        let mut log = ChangeLog::new();
        let mut store = SnapshotStore::new();
        let a = log
            .record(
                &mut store,
                &registry(),
                new_change("e1", Some(json!({"text": "a"}))),
            )
            .unwrap();
        log.seal_pending();

        assert_eq!(log.position(), 1);
        let rows = log.rows_from(0);
        assert_eq!(rows.len(), 1);

        // Re-inserting the same row is skipped.
        assert!(!log.insert_row(a.clone()));
        assert_eq!(log.len(), 1);

        let mut other = a.clone();
        other.id = ChangeId::new();
        assert!(log.insert_row(other));
        assert_eq!(log.len(), 2);
    }
}
