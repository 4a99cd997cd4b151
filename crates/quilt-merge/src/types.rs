use serde::{Deserialize, Serialize};

use quilt_types::ChangeId;

/// A detected divergence between two changes to the same entity.
///
/// The pair is unordered in meaning but stored as (source side, target side)
/// of the merge that detected it. Resolution records the winning change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub change_id: ChangeId,
    pub conflicting_change_id: ChangeId,
    pub resolved_with_change_id: Option<ChangeId>,
}

impl Conflict {
    pub fn new(change_id: ChangeId, conflicting_change_id: ChangeId) -> Self {
        Self {
            change_id,
            conflicting_change_id,
            resolved_with_change_id: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_with_change_id.is_some()
    }

    /// Returns `true` if `change` is one of the two conflicting changes.
    pub fn involves(&self, change: &ChangeId) -> bool {
        self.change_id == *change || self.conflicting_change_id == *change
    }

    /// Returns `true` if this conflict is between the given pair, in either
    /// order.
    pub fn matches_pair(&self, a: &ChangeId, b: &ChangeId) -> bool {
        (self.change_id == *a && self.conflicting_change_id == *b)
            || (self.change_id == *b && self.conflicting_change_id == *a)
    }
}

/// What a merge does when unresolved conflicts remain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Refuse the merge and leave both versions untouched.
    #[default]
    Fail,
    /// Complete the merge and stage the conflicts for later resolution.
    Stage,
}
