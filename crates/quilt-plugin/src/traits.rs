use quilt_log::FileRow;

use crate::error::PluginResult;
use crate::types::{ConflictCandidate, DetectedChange, EntityPatch, PluginConflict};

/// A format plugin. Implementations own one file format end to end.
pub trait ChangePlugin: Send + Sync {
    /// Stable key recorded on every change this plugin produces.
    fn key(&self) -> &str;

    /// Whether this plugin wants to handle the given file. The registry only
    /// routes matching files to [`detect_changes`](Self::detect_changes).
    fn handles(&self, file: &FileRow) -> bool;

    /// Diff two byte states of a file into entity-level changes.
    ///
    /// `before` is `None` when the file is new. Unchanged entities must not
    /// be reported.
    fn detect_changes(
        &self,
        before: Option<&FileRow>,
        after: &FileRow,
    ) -> PluginResult<Vec<DetectedChange>>;

    /// Write resolved entity states back into file bytes.
    fn apply_changes(&self, file: &FileRow, patches: &[EntityPatch]) -> PluginResult<Vec<u8>>;

    /// Format-aware conflict detection over change pairs that touched the
    /// same entity on both sides. Plugins see every such pair and may
    /// confirm a subset, so a format can flag conflicts the content
    /// comparison would miss or drop ones it can merge structurally.
    ///
    /// The default applies the content-equality rule: a pair conflicts only
    /// when the two sides disagree and both moved away from the base.
    fn detect_conflicts(
        &self,
        candidates: &[ConflictCandidate],
    ) -> PluginResult<Vec<PluginConflict>> {
        Ok(candidates
            .iter()
            .filter(|c| c.ours != c.theirs && c.ours != c.base && c.theirs != c.base)
            .map(|c| PluginConflict {
                change_id: c.change_id,
                conflicting_change_id: c.conflicting_change_id,
            })
            .collect())
    }
}
