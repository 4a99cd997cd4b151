use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use quilt_log::Change;
use quilt_types::{ChangeId, ChangeSetId};

/// A sealed, atomic group of changes (a "commit").
///
/// Membership is immutable once the set is created; later merges only add
/// edges, never elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub id: ChangeSetId,
    /// Free-form commit metadata (message, author, host-defined keys).
    pub metadata: BTreeMap<String, String>,
}

/// Membership record linking a change to its authoring change set.
///
/// The denormalized entity columns let conflict detection and cache rebuild
/// scope work without loading every change row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSetElement {
    pub change_set_id: ChangeSetId,
    pub change_id: ChangeId,
    pub entity_id: String,
    pub schema_key: String,
    pub file_id: String,
}

impl ChangeSetElement {
    /// Build an element from a sealed change.
    pub fn from_change(change_set_id: ChangeSetId, change: &Change) -> Self {
        Self {
            change_set_id,
            change_id: change.id,
            entity_id: change.entity_id.clone(),
            schema_key: change.schema_key.clone(),
            file_id: change.file_id.clone(),
        }
    }
}

/// A parent/child edge in the change-set DAG.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSetEdge {
    pub parent_id: ChangeSetId,
    pub child_id: ChangeSetId,
}

/// How far an ancestor query reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraversalMode {
    /// Only the change set itself.
    Direct,
    /// The set plus its transitive parents, optionally depth-limited.
    Recursive(Option<usize>),
}
