use serde::{Deserialize, Serialize};
use serde_json::Value;

use quilt_types::ChangeId;

/// One entity-level change a plugin found between two file states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedChange {
    pub entity_id: String,
    pub schema_key: String,
    pub schema_version: String,
    /// The entity's new value; `None` marks a deletion.
    pub content: Option<Value>,
}

/// A detection attributed to the plugin that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginDetection {
    pub plugin_key: String,
    pub change: DetectedChange,
}

/// One resolved entity state handed to [`apply_changes`] for writing back
/// into file bytes.
///
/// [`apply_changes`]: crate::ChangePlugin::apply_changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityPatch {
    pub entity_id: String,
    pub schema_key: String,
    /// The value to materialize; `None` removes the entity from the file.
    pub content: Option<Value>,
}

/// A pair of diverging changes to the same entity, offered to plugins for
/// format-aware conflict detection.
#[derive(Clone, Debug)]
pub struct ConflictCandidate {
    pub entity_id: String,
    pub schema_key: String,
    pub file_id: String,
    pub change_id: ChangeId,
    pub conflicting_change_id: ChangeId,
    /// Content at the common ancestor, if any.
    pub base: Option<Value>,
    pub ours: Option<Value>,
    pub theirs: Option<Value>,
}

/// A conflict a plugin confirmed between two changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginConflict {
    pub change_id: ChangeId,
    pub conflicting_change_id: ChangeId,
}
