use serde::{Deserialize, Serialize};

use quilt_types::{ChangeSetId, VersionId};

/// A named, mutable pointer into the change-set graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub name: String,
    /// The change set this version currently points at. Reassigned on every
    /// commit, merge, and switch; never mutated in place anywhere else.
    pub change_set_id: ChangeSetId,
}

impl Version {
    pub fn new(name: impl Into<String>, change_set_id: ChangeSetId) -> Self {
        Self {
            id: VersionId::new(),
            name: name.into(),
            change_set_id,
        }
    }
}
