use serde::{Deserialize, Serialize};
use serde_json::Value;

use quilt_types::{ChangeId, SnapshotId, Timestamp};

/// The grouping key under which changes to the same logical entity collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub entity_id: String,
    pub file_id: String,
    pub schema_key: String,
}

/// One recorded mutation of one entity. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub id: ChangeId,
    pub entity_id: String,
    pub file_id: String,
    pub schema_key: String,
    pub schema_version: String,
    pub plugin_key: String,
    /// Content-addressed snapshot of the entity's new value. The no-content
    /// sentinel marks a deletion.
    pub snapshot_id: SnapshotId,
    /// Previous change for the same entity, when known. Lineage can also be
    /// derived through change-set ancestry, so this is advisory.
    pub parent_id: Option<ChangeId>,
    pub created_at: Timestamp,
}

impl Change {
    /// The entity grouping key of this change.
    pub fn entity_key(&self) -> EntityKey {
        EntityKey {
            entity_id: self.entity_id.clone(),
            file_id: self.file_id.clone(),
            schema_key: self.schema_key.clone(),
        }
    }

    /// Returns `true` if this change deletes the entity.
    pub fn is_deletion(&self) -> bool {
        self.snapshot_id.is_no_content()
    }
}

/// Input to [`ChangeLog::record`](crate::ChangeLog::record).
#[derive(Clone, Debug)]
pub struct NewChange {
    pub entity_id: String,
    pub file_id: String,
    pub schema_key: String,
    pub schema_version: String,
    pub plugin_key: String,
    /// The entity's new value; `None` records a deletion.
    pub content: Option<Value>,
    pub parent_id: Option<ChangeId>,
}
