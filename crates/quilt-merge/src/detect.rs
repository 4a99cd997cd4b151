use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use quilt_graph::{ChangeSetGraph, TraversalMode};
use quilt_log::{Change, ChangeLog, EntityKey};
use quilt_plugin::{ConflictCandidate, PluginRegistry};
use quilt_store::SnapshotStore;
use quilt_types::{CancelToken, ChangeSetId};

use crate::error::MergeResult;
use crate::types::Conflict;

/// Detect conflicts between two change-set tips.
///
/// Only changes in the symmetric difference of the two histories are
/// considered. For each entity touched on both sides, the leaf change per
/// side and the common-ancestor content form a candidate that goes to the
/// owning plugin first, so a format-aware verdict pre-empts the content
/// comparison. Without a plugin, and when a plugin fails, the generic rule
/// applies: equal content is convergent and never conflicts, and a side
/// that still matches the ancestor content did not diverge.
pub fn detect_conflicts(
    graph: &ChangeSetGraph,
    log: &ChangeLog,
    store: &SnapshotStore,
    plugins: &PluginRegistry,
    source: &ChangeSetId,
    target: &ChangeSetId,
    cancel: Option<&CancelToken>,
) -> MergeResult<Vec<Conflict>> {
    let diff = graph.symmetric_difference(source, target, cancel)?;
    if diff.is_empty() {
        return Ok(Vec::new());
    }

    let source_history = graph.changes_in_history(source, cancel)?;
    let target_history = graph.changes_in_history(target, cancel)?;

    // Group the diverging changes per entity, split by side.
    let mut by_entity: BTreeMap<EntityKey, (Vec<&Change>, Vec<&Change>)> = BTreeMap::new();
    for id in &diff {
        let change = log.get(id)?;
        let entry = by_entity.entry(change.entity_key()).or_default();
        if source_history.contains(id) {
            entry.0.push(change);
        }
        if target_history.contains(id) {
            entry.1.push(change);
        }
    }

    let base_tip = graph.common_ancestor(source, target);
    let mut conflicts = Vec::new();

    for (key, (source_side, target_side)) in &by_entity {
        let (Some(ours), Some(theirs)) = (leaf_change(source_side), leaf_change(target_side))
        else {
            continue;
        };

        let our_content = content_of(store, ours)?;
        let their_content = content_of(store, theirs)?;
        let base = match &base_tip {
            Some(tip) => entity_content_at(graph, log, store, tip, key, cancel)?,
            None => None,
        };

        let candidate = ConflictCandidate {
            entity_id: key.entity_id.clone(),
            schema_key: key.schema_key.clone(),
            file_id: key.file_id.clone(),
            change_id: ours.id,
            conflicting_change_id: theirs.id,
            base,
            ours: our_content,
            theirs: their_content,
        };

        for confirmed in consult_plugin(plugins, &ours.plugin_key, candidate) {
            debug!(
                entity = %key.entity_id,
                ours = %confirmed.change_id.short_id(),
                theirs = %confirmed.conflicting_change_id.short_id(),
                "detected conflict"
            );
            conflicts.push(confirmed);
        }
    }

    Ok(conflicts)
}

/// The side's most recent change by creation time, ties broken by id.
fn leaf_change<'a>(side: &[&'a Change]) -> Option<&'a Change> {
    side.iter()
        .copied()
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
}

fn content_of(store: &SnapshotStore, change: &Change) -> MergeResult<Option<Value>> {
    if change.is_deletion() {
        return Ok(None);
    }
    Ok(store.read(&change.snapshot_id)?)
}

/// The entity's content as visible from `tip`: the change authored by the
/// nearest ancestor change set that touches the entity, ties within one set
/// broken by creation time then id.
fn entity_content_at(
    graph: &ChangeSetGraph,
    log: &ChangeLog,
    store: &SnapshotStore,
    tip: &ChangeSetId,
    key: &EntityKey,
    cancel: Option<&CancelToken>,
) -> MergeResult<Option<Value>> {
    // BFS order from the tip, so the first hit is the nearest.
    let sets = graph.ancestors_of(tip, TraversalMode::Recursive(None), cancel)?;
    for set in sets {
        let mut winner: Option<&Change> = None;
        for element in graph.elements_of(&set) {
            if element.entity_id != key.entity_id
                || element.file_id != key.file_id
                || element.schema_key != key.schema_key
            {
                continue;
            }
            let change = log.get(&element.change_id)?;
            winner = match winner {
                Some(current)
                    if (current.created_at, current.id) >= (change.created_at, change.id) =>
                {
                    Some(current)
                }
                _ => Some(change),
            };
        }
        if let Some(change) = winner {
            return content_of(store, change);
        }
    }
    Ok(None)
}

/// Offer a candidate to its plugin. Unknown plugins and plugin failures fall
/// back to the generic rule.
fn consult_plugin(
    plugins: &PluginRegistry,
    plugin_key: &str,
    candidate: ConflictCandidate,
) -> Vec<Conflict> {
    match plugins.get(plugin_key) {
        Ok(plugin) => match plugin.detect_conflicts(std::slice::from_ref(&candidate)) {
            Ok(confirmed) => confirmed
                .into_iter()
                .map(|c| Conflict::new(c.change_id, c.conflicting_change_id))
                .collect(),
            Err(err) => {
                warn!(plugin = plugin_key, error = %err, "plugin conflict detection failed");
                generic_verdict(&candidate)
            }
        },
        Err(_) => generic_verdict(&candidate),
    }
}

/// The content-equality rule: a pair conflicts only when the two sides
/// disagree and both moved away from the ancestor content.
fn generic_verdict(candidate: &ConflictCandidate) -> Vec<Conflict> {
    if candidate.ours == candidate.theirs
        || candidate.ours == candidate.base
        || candidate.theirs == candidate.base
    {
        return Vec::new();
    }
    vec![Conflict::new(
        candidate.change_id,
        candidate.conflicting_change_id,
    )]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use serde_json::json;

    use quilt_graph::{ChangeSet, ChangeSetElement};
    use quilt_log::{FileRow, NewChange};
    use quilt_plugin::{ChangePlugin, DetectedChange, EntityPatch, PluginConflict, PluginResult};
    use quilt_schema::SchemaRegistry;

    use super::*;

    struct Fixture {
        graph: ChangeSetGraph,
        log: ChangeLog,
        store: SnapshotStore,
        registry: SchemaRegistry,
        plugins: PluginRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let mut registry = SchemaRegistry::new();
            registry
                .register("label", "1.0", &json!({"type": "object"}))
                .unwrap();
            Self {
                graph: ChangeSetGraph::new(),
                log: ChangeLog::new(),
                store: SnapshotStore::new(),
                registry,
                plugins: PluginRegistry::new(),
            }
        }

        /// Record one change to `entity` and seal it into a new change set.
        fn commit(
            &mut self,
            entity: &str,
            content: Option<serde_json::Value>,
            parents: &[ChangeSetId],
        ) -> (ChangeSetId, quilt_types::ChangeId) {
            let change = self
                .log
                .record(
                    &mut self.store,
                    &self.registry,
                    NewChange {
                        entity_id: entity.into(),
                        file_id: "file-1".into(),
                        schema_key: "label".into(),
                        schema_version: "1.0".into(),
                        plugin_key: "test-plugin".into(),
                        content,
                        parent_id: None,
                    },
                )
                .unwrap();
            let sealed = self.log.seal_pending();
            let set_id = ChangeSetId::new();
            let elements = sealed
                .iter()
                .map(|c| ChangeSetElement::from_change(set_id, c))
                .collect();
            self.graph
                .create(
                    ChangeSet {
                        id: set_id,
                        metadata: BTreeMap::new(),
                    },
                    elements,
                    parents,
                )
                .unwrap();
            (set_id, change.id)
        }

        fn detect(&self, a: &ChangeSetId, b: &ChangeSetId) -> Vec<Conflict> {
            detect_conflicts(
                &self.graph,
                &self.log,
                &self.store,
                &self.plugins,
                a,
                b,
                None,
            )
            .unwrap()
        }
    }

    // ----------------------------------------------------------
    // Generic detection
    // ----------------------------------------------------------

    #[test]
    fn divergent_edits_conflict_exactly_once() {
        let mut fx = Fixture::new();
        let (base, _) = fx.commit("e", Some(json!({"text": "Foo"})), &[]);
        let (left, c_left) = fx.commit("e", Some(json!({"text": "Bar"})), &[base]);
        let (right, c_right) = fx.commit("e", Some(json!({"text": "Baz"})), &[base]);

        let conflicts = fx.detect(&left, &right);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].matches_pair(&c_left, &c_right));
        assert!(!conflicts[0].is_resolved());
    }

    #[test]
    fn convergent_edits_do_not_conflict() {
        let mut fx = Fixture::new();
        let (base, _) = fx.commit("e", Some(json!({"text": "Foo"})), &[]);
        let (left, _) = fx.commit("e", Some(json!({"text": "Bar"})), &[base]);
        let (right, _) = fx.commit("e", Some(json!({"text": "Bar"})), &[base]);

        assert!(fx.detect(&left, &right).is_empty());
    }

    #[test]
    fn single_sided_edit_does_not_conflict() {
        let mut fx = Fixture::new();
        let (base, _) = fx.commit("e", Some(json!({"text": "Foo"})), &[]);
        let (left, _) = fx.commit("e", Some(json!({"text": "Bar"})), &[base]);

        assert!(fx.detect(&left, &base).is_empty());
    }

    #[test]
    fn edit_back_to_ancestor_content_does_not_conflict() {
        let mut fx = Fixture::new();
        let (base, _) = fx.commit("e", Some(json!({"text": "Foo"})), &[]);
        let (left, _) = fx.commit("e", Some(json!({"text": "Bar"})), &[base]);
        // The right side touches the entity but restores the base value.
        let (right, _) = fx.commit("e", Some(json!({"text": "Foo"})), &[base]);

        assert!(fx.detect(&left, &right).is_empty());
    }

    #[test]
    fn different_entities_do_not_conflict() {
        let mut fx = Fixture::new();
        let (base, _) = fx.commit("e1", Some(json!({"text": "Foo"})), &[]);
        let (left, _) = fx.commit("e1", Some(json!({"text": "Bar"})), &[base]);
        let (right, _) = fx.commit("e2", Some(json!({"text": "Baz"})), &[base]);

        assert!(fx.detect(&left, &right).is_empty());
    }

    #[test]
    fn deletion_against_edit_conflicts() {
        let mut fx = Fixture::new();
        let (base, _) = fx.commit("e", Some(json!({"text": "Foo"})), &[]);
        let (left, c_left) = fx.commit("e", Some(json!({"text": "Bar"})), &[base]);
        let (right, c_right) = fx.commit("e", None, &[base]);

        let conflicts = fx.detect(&left, &right);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].matches_pair(&c_left, &c_right));
    }

    #[test]
    fn equal_tips_have_no_conflicts() {
        let mut fx = Fixture::new();
        let (base, _) = fx.commit("e", Some(json!({"text": "Foo"})), &[]);
        assert!(fx.detect(&base, &base).is_empty());
    }

    // ----------------------------------------------------------
    // Plugin veto
    // ----------------------------------------------------------

    struct VetoPlugin;

    impl ChangePlugin for VetoPlugin {
        fn key(&self) -> &str {
            "test-plugin"
        }

        fn handles(&self, _file: &FileRow) -> bool {
            true
        }

        fn detect_changes(
            &self,
            _before: Option<&FileRow>,
            _after: &FileRow,
        ) -> PluginResult<Vec<DetectedChange>> {
            Ok(Vec::new())
        }

        fn apply_changes(&self, file: &FileRow, _patches: &[EntityPatch]) -> PluginResult<Vec<u8>> {
            Ok(file.data.clone())
        }

        fn detect_conflicts(
            &self,
            _candidates: &[ConflictCandidate],
        ) -> PluginResult<Vec<PluginConflict>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn plugin_can_veto_a_candidate() {
        let mut fx = Fixture::new();
        fx.plugins.register(Arc::new(VetoPlugin)).unwrap();

        let (base, _) = fx.commit("e", Some(json!({"text": "Foo"})), &[]);
        let (left, _) = fx.commit("e", Some(json!({"text": "Bar"})), &[base]);
        let (right, _) = fx.commit("e", Some(json!({"text": "Baz"})), &[base]);

        assert!(fx.detect(&left, &right).is_empty());
    }

    /// Confirms every candidate it is shown, equal content included.
    struct ConfirmAllPlugin;

    impl ChangePlugin for ConfirmAllPlugin {
        fn key(&self) -> &str {
            "test-plugin"
        }

        fn handles(&self, _file: &FileRow) -> bool {
            true
        }

        fn detect_changes(
            &self,
            _before: Option<&FileRow>,
            _after: &FileRow,
        ) -> PluginResult<Vec<DetectedChange>> {
            Ok(Vec::new())
        }

        fn apply_changes(&self, file: &FileRow, _patches: &[EntityPatch]) -> PluginResult<Vec<u8>> {
            Ok(file.data.clone())
        }

        fn detect_conflicts(
            &self,
            candidates: &[ConflictCandidate],
        ) -> PluginResult<Vec<PluginConflict>> {
            Ok(candidates
                .iter()
                .map(|c| PluginConflict {
                    change_id: c.change_id,
                    conflicting_change_id: c.conflicting_change_id,
                })
                .collect())
        }
    }

    #[test]
    fn plugin_verdict_preempts_the_content_equality_rule() {
        let mut fx = Fixture::new();
        fx.plugins.register(Arc::new(ConfirmAllPlugin)).unwrap();

        // Both sides land on the same bytes. Without a plugin this pair is
        // convergent; the plugin still sees it and may call it a conflict.
        let (base, _) = fx.commit("e", Some(json!({"text": "Foo"})), &[]);
        let (left, c_left) = fx.commit("e", Some(json!({"text": "Bar"})), &[base]);
        let (right, c_right) = fx.commit("e", Some(json!({"text": "Bar"})), &[base]);

        let conflicts = fx.detect(&left, &right);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].matches_pair(&c_left, &c_right));
    }
}
