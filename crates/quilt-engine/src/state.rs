use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use quilt_cache::StateCache;
use quilt_graph::{ChangeSet, ChangeSetGraph};
use quilt_log::{ChangeLog, FileStore};
use quilt_merge::ConflictStore;
use quilt_query::ViewCatalog;
use quilt_refs::{Version, VersionStore};
use quilt_schema::SchemaRegistry;
use quilt_store::SnapshotStore;
use quilt_types::ChangeSetId;

use crate::error::EngineResult;

pub const DEFAULT_VERSION_NAME: &str = "main";

/// Everything the engine owns, as one cloneable value.
///
/// Transactions clone the whole state, mutate the clone, and swap it back
/// on success; an error discards the clone, so partial mutations never
/// become visible. The state is also the export/import payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineState {
    pub snapshots: SnapshotStore,
    pub schemas: SchemaRegistry,
    pub files: FileStore,
    pub log: ChangeLog,
    pub graph: ChangeSetGraph,
    pub versions: VersionStore,
    pub conflicts: ConflictStore,
    pub views: ViewCatalog,
    pub cache: StateCache,
}

impl EngineState {
    /// A fresh state with an empty root change set and a current `main`
    /// version pointing at it.
    pub fn bootstrap() -> EngineResult<Self> {
        let mut state = Self::default();
        let root = ChangeSet {
            id: ChangeSetId::new(),
            metadata: BTreeMap::new(),
        };
        let root_id = root.id;
        state.graph.create(root, Vec::new(), &[])?;

        let main = Version::new(DEFAULT_VERSION_NAME, root_id);
        let main_id = main.id;
        state.versions.insert(main)?;
        state.versions.switch_to(&main_id)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_creates_current_main() {
        let state = EngineState::bootstrap().unwrap();
        let current = state.versions.current().unwrap();
        assert_eq!(current.name, DEFAULT_VERSION_NAME);
        assert!(state.graph.contains(&current.change_set_id));
        assert!(state.graph.parents_of(&current.change_set_id).is_empty());
        assert!(state.cache.is_fresh());
    }
}
