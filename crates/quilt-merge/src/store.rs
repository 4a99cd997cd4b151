use serde::{Deserialize, Serialize};
use tracing::debug;

use quilt_types::ChangeId;

use crate::error::{MergeError, MergeResult};
use crate::types::Conflict;

/// Staged conflicts awaiting resolution, in detection order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConflictStore {
    rows: Vec<Conflict>,
}

impl ConflictStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn all(&self) -> &[Conflict] {
        &self.rows
    }

    pub fn unresolved(&self) -> Vec<&Conflict> {
        self.rows.iter().filter(|c| !c.is_resolved()).collect()
    }

    /// Stage a conflict. Re-staging a pair that is already present and
    /// unresolved is a no-op.
    pub fn stage(&mut self, conflict: Conflict) {
        let exists = self.rows.iter().any(|c| {
            !c.is_resolved() && c.matches_pair(&conflict.change_id, &conflict.conflicting_change_id)
        });
        if !exists {
            self.rows.push(conflict);
        }
    }

    /// Resolve the unresolved conflict between `a` and `b` by selecting one
    /// of the two changes as the winner.
    pub fn resolve_by_selecting(
        &mut self,
        a: &ChangeId,
        b: &ChangeId,
        selected: &ChangeId,
    ) -> MergeResult<&Conflict> {
        let conflict = self
            .rows
            .iter_mut()
            .find(|c| !c.is_resolved() && c.matches_pair(a, b))
            .ok_or(MergeError::ConflictNotFound(*a, *b))?;
        if !conflict.involves(selected) {
            return Err(MergeError::SelectionNotInConflict(*selected));
        }
        debug!(selected = %selected.short_id(), "resolved conflict");
        conflict.resolved_with_change_id = Some(*selected);
        Ok(conflict)
    }
}
