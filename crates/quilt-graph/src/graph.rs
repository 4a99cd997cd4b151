use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use quilt_types::{CancelToken, ChangeId, ChangeSetId};

use crate::error::{GraphError, GraphResult};
use crate::types::{ChangeSet, ChangeSetEdge, ChangeSetElement, TraversalMode};

/// The change-set DAG.
///
/// Stores sealed change sets, their element membership, and parent edges.
/// Maintains a forward-edge index (`children`) for descendant queries and
/// insertion-ordered row vectors that double as sync positions.
///
/// # Invariants
///
/// - Acyclic: `create` only links to pre-existing parents; `add_edge`
///   rejects edges whose child is already an ancestor of the parent.
/// - A change is authored by exactly one change set.
/// - Every edge endpoint resolves to an existing change set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChangeSetGraph {
    sets: BTreeMap<ChangeSetId, ChangeSet>,
    set_order: Vec<ChangeSetId>,
    elements: Vec<ChangeSetElement>,
    elements_by_set: BTreeMap<ChangeSetId, Vec<usize>>,
    authored_by: BTreeMap<ChangeId, ChangeSetId>,
    edges: Vec<ChangeSetEdge>,
    parents: BTreeMap<ChangeSetId, Vec<ChangeSetId>>,
    children: BTreeMap<ChangeSetId, Vec<ChangeSetId>>,
}

impl ChangeSetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of change sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Atomically create a change set with its elements and parent edges.
    ///
    /// Every parent must already exist; every element's change must not be
    /// authored elsewhere. On any failure nothing is inserted.
    pub fn create(
        &mut self,
        set: ChangeSet,
        elements: Vec<ChangeSetElement>,
        parents: &[ChangeSetId],
    ) -> GraphResult<()> {
        if self.sets.contains_key(&set.id) {
            return Err(GraphError::DuplicateChangeSet(set.id));
        }
        for parent in parents {
            if !self.sets.contains_key(parent) {
                return Err(GraphError::UnknownParent(*parent));
            }
        }
        for element in &elements {
            if let Some(owner) = self.authored_by.get(&element.change_id) {
                return Err(GraphError::ChangeAlreadyAuthored {
                    change: element.change_id,
                    owner: *owner,
                });
            }
        }

        let id = set.id;
        debug!(
            change_set = %id.short_id(),
            elements = elements.len(),
            parents = parents.len(),
            "created change set"
        );

        self.sets.insert(id, set);
        self.set_order.push(id);
        for element in elements {
            self.authored_by.insert(element.change_id, id);
            self.elements_by_set
                .entry(id)
                .or_default()
                .push(self.elements.len());
            self.elements.push(element);
        }
        for parent in parents {
            self.insert_edge_unchecked(*parent, id);
        }
        Ok(())
    }

    /// Record a later merge edge between two existing change sets.
    ///
    /// Fails if either endpoint is unknown or if the edge would create a
    /// cycle. Inserting an existing edge is a no-op.
    pub fn add_edge(&mut self, parent: ChangeSetId, child: ChangeSetId) -> GraphResult<()> {
        if !self.sets.contains_key(&parent) {
            return Err(GraphError::UnknownChangeSet(parent));
        }
        if !self.sets.contains_key(&child) {
            return Err(GraphError::UnknownChangeSet(child));
        }
        if self
            .parents
            .get(&child)
            .is_some_and(|p| p.contains(&parent))
        {
            return Ok(());
        }
        // A cycle appears iff `child` is already an ancestor of `parent`.
        if parent == child || self.ancestor_set(&parent).contains(&child) {
            return Err(GraphError::CycleDetected { parent, child });
        }
        self.insert_edge_unchecked(parent, child);
        Ok(())
    }

    fn insert_edge_unchecked(&mut self, parent: ChangeSetId, child: ChangeSetId) {
        self.edges.push(ChangeSetEdge {
            parent_id: parent,
            child_id: child,
        });
        self.parents.entry(child).or_default().push(parent);
        self.children.entry(parent).or_default().push(child);
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    pub fn get(&self, id: &ChangeSetId) -> GraphResult<&ChangeSet> {
        self.sets.get(id).ok_or(GraphError::UnknownChangeSet(*id))
    }

    pub fn contains(&self, id: &ChangeSetId) -> bool {
        self.sets.contains_key(id)
    }

    /// Direct parents of a change set.
    pub fn parents_of(&self, id: &ChangeSetId) -> &[ChangeSetId] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct children of a change set.
    pub fn children_of(&self, id: &ChangeSetId) -> &[ChangeSetId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Elements authored by one change set.
    pub fn elements_of(&self, id: &ChangeSetId) -> Vec<&ChangeSetElement> {
        self.elements_by_set
            .get(id)
            .map(|idxs| idxs.iter().map(|&i| &self.elements[i]).collect())
            .unwrap_or_default()
    }

    /// The change set that authored a change, if sealed.
    pub fn authoring_set(&self, change: &ChangeId) -> Option<ChangeSetId> {
        self.authored_by.get(change).copied()
    }

    // ---------------------------------------------------------------
    // Traversal
    // ---------------------------------------------------------------

    /// Ancestors of `id` per `mode`, always including `id` itself.
    ///
    /// `Direct` returns only the set; `Recursive(depth)` walks transitive
    /// parents breadth-first, optionally depth-limited. The walk checks the
    /// cancel token between levels and discards partial results when
    /// cancelled.
    pub fn ancestors_of(
        &self,
        id: &ChangeSetId,
        mode: TraversalMode,
        cancel: Option<&CancelToken>,
    ) -> GraphResult<Vec<ChangeSetId>> {
        if !self.sets.contains_key(id) {
            return Err(GraphError::UnknownChangeSet(*id));
        }
        match mode {
            TraversalMode::Direct => Ok(vec![*id]),
            TraversalMode::Recursive(max_depth) => {
                let mut visited: HashSet<ChangeSetId> = HashSet::new();
                visited.insert(*id);
                let mut result = vec![*id];
                let mut queue: VecDeque<(ChangeSetId, usize)> = VecDeque::new();
                queue.push_back((*id, 0));

                while let Some((current, depth)) = queue.pop_front() {
                    if cancel.is_some_and(CancelToken::is_cancelled) {
                        return Err(GraphError::Cancelled);
                    }
                    if max_depth.is_some_and(|max| depth >= max) {
                        continue;
                    }
                    for parent in self.parents_of(&current) {
                        if visited.insert(*parent) {
                            result.push(*parent);
                            queue.push_back((*parent, depth + 1));
                        }
                    }
                }
                Ok(result)
            }
        }
    }

    /// Full ancestor set of `id` (excluding `id`), unbounded.
    fn ancestor_set(&self, id: &ChangeSetId) -> HashSet<ChangeSetId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(*id);
        while let Some(current) = queue.pop_front() {
            for parent in self.parents_of(&current) {
                if visited.insert(*parent) {
                    queue.push_back(*parent);
                }
            }
        }
        visited
    }

    /// All change ids in the element-membership closure of `tip`'s history
    /// (tip included).
    pub fn changes_in_history(
        &self,
        tip: &ChangeSetId,
        cancel: Option<&CancelToken>,
    ) -> GraphResult<BTreeSet<ChangeId>> {
        let sets = self.ancestors_of(tip, TraversalMode::Recursive(None), cancel)?;
        let mut changes = BTreeSet::new();
        for set in sets {
            for element in self.elements_of(&set) {
                changes.insert(element.change_id);
            }
        }
        Ok(changes)
    }

    /// Changes reachable from exactly one of the two histories.
    ///
    /// This scopes conflict detection to the changes that actually diverge,
    /// instead of an all-pairs comparison over full history. Empty when the
    /// two tips are equal.
    pub fn symmetric_difference(
        &self,
        a: &ChangeSetId,
        b: &ChangeSetId,
        cancel: Option<&CancelToken>,
    ) -> GraphResult<BTreeSet<ChangeId>> {
        let history_a = self.changes_in_history(a, cancel)?;
        let history_b = self.changes_in_history(b, cancel)?;
        Ok(history_a.symmetric_difference(&history_b).copied().collect())
    }

    /// The most recently created common ancestor of two change sets.
    ///
    /// Uses the ancestor-set intersection approach; `ChangeSetId`s are
    /// UUIDv7 and therefore time-ordered, so "max id" picks the common
    /// ancestor closest to both tips deterministically.
    pub fn common_ancestor(
        &self,
        a: &ChangeSetId,
        b: &ChangeSetId,
    ) -> Option<ChangeSetId> {
        if !self.sets.contains_key(a) || !self.sets.contains_key(b) {
            return None;
        }
        if a == b {
            return Some(*a);
        }
        let mut ancestors_a = self.ancestor_set(a);
        ancestors_a.insert(*a);
        let mut ancestors_b = self.ancestor_set(b);
        ancestors_b.insert(*b);
        ancestors_a.intersection(&ancestors_b).max().copied()
    }

    // ---------------------------------------------------------------
    // Sync rows
    // ---------------------------------------------------------------

    /// Change-set rows at sync positions `>= from`.
    pub fn set_rows_from(&self, from: u64) -> Vec<ChangeSet> {
        self.set_order
            .iter()
            .skip(from as usize)
            .map(|id| self.sets[id].clone())
            .collect()
    }

    /// Element rows at sync positions `>= from`.
    pub fn element_rows_from(&self, from: u64) -> Vec<ChangeSetElement> {
        self.elements.iter().skip(from as usize).cloned().collect()
    }

    /// Edge rows at sync positions `>= from`.
    pub fn edge_rows_from(&self, from: u64) -> Vec<ChangeSetEdge> {
        self.edges.iter().skip(from as usize).cloned().collect()
    }

    /// Current sync positions: (sets, elements, edges).
    pub fn positions(&self) -> (u64, u64, u64) {
        (
            self.set_order.len() as u64,
            self.elements.len() as u64,
            self.edges.len() as u64,
        )
    }

    /// Insert a change-set row received over sync, skipping existing ids.
    pub fn insert_set_row(&mut self, set: ChangeSet) -> bool {
        if self.sets.contains_key(&set.id) {
            return false;
        }
        self.set_order.push(set.id);
        self.sets.insert(set.id, set);
        true
    }

    /// Insert an element row received over sync, skipping duplicates.
    pub fn insert_element_row(&mut self, element: ChangeSetElement) -> bool {
        if self.authored_by.contains_key(&element.change_id) {
            return false;
        }
        self.authored_by
            .insert(element.change_id, element.change_set_id);
        self.elements_by_set
            .entry(element.change_set_id)
            .or_default()
            .push(self.elements.len());
        self.elements.push(element);
        true
    }

    /// Insert an edge row received over sync, skipping duplicates and
    /// refusing cycles.
    pub fn insert_edge_row(&mut self, edge: ChangeSetEdge) -> GraphResult<bool> {
        if self
            .parents
            .get(&edge.child_id)
            .is_some_and(|p| p.contains(&edge.parent_id))
        {
            return Ok(false);
        }
        self.add_edge(edge.parent_id, edge.child_id)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn set(id: ChangeSetId) -> ChangeSet {
        ChangeSet {
            id,
            metadata: BTreeMap::new(),
        }
    }

    fn element(set_id: ChangeSetId, change: ChangeId, entity: &str) -> ChangeSetElement {
        ChangeSetElement {
            change_set_id: set_id,
            change_id: change,
            entity_id: entity.into(),
            schema_key: "label".into(),
            file_id: "file-1".into(),
        }
    }

    /// Linear chain: a <- b <- c, each authoring one change.
    fn linear() -> (ChangeSetGraph, [ChangeSetId; 3], [ChangeId; 3]) {
        let mut graph = ChangeSetGraph::new();
        let ids = [ChangeSetId::new(), ChangeSetId::new(), ChangeSetId::new()];
        let changes = [ChangeId::new(), ChangeId::new(), ChangeId::new()];
        graph
            .create(set(ids[0]), vec![element(ids[0], changes[0], "e")], &[])
            .unwrap();
        graph
            .create(
                set(ids[1]),
                vec![element(ids[1], changes[1], "e")],
                &[ids[0]],
            )
            .unwrap();
        graph
            .create(
                set(ids[2]),
                vec![element(ids[2], changes[2], "e")],
                &[ids[1]],
            )
            .unwrap();
        (graph, ids, changes)
    }

    /// Diamond: root, two branches, merge.
    fn diamond() -> (ChangeSetGraph, [ChangeSetId; 4]) {
        let mut graph = ChangeSetGraph::new();
        let ids = [
            ChangeSetId::new(),
            ChangeSetId::new(),
            ChangeSetId::new(),
            ChangeSetId::new(),
        ];
        graph.create(set(ids[0]), vec![], &[]).unwrap();
        graph.create(set(ids[1]), vec![], &[ids[0]]).unwrap();
        graph.create(set(ids[2]), vec![], &[ids[0]]).unwrap();
        graph
            .create(set(ids[3]), vec![], &[ids[1], ids[2]])
            .unwrap();
        (graph, ids)
    }

    // ----------------------------------------------------------
    // Construction
    // ----------------------------------------------------------

    #[test]
    fn empty_graph() {
        let graph = ChangeSetGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut graph = ChangeSetGraph::new();
        let err = graph
            .create(set(ChangeSetId::new()), vec![], &[ChangeSetId::new()])
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownParent(_)));
        assert!(graph.is_empty());
    }

    #[test]
    fn duplicate_change_set_is_rejected() {
        let mut graph = ChangeSetGraph::new();
        let id = ChangeSetId::new();
        graph.create(set(id), vec![], &[]).unwrap();
        let err = graph.create(set(id), vec![], &[]).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateChangeSet(_)));
    }

    #[test]
    fn change_belongs_to_exactly_one_set() {
        let mut graph = ChangeSetGraph::new();
        let a = ChangeSetId::new();
        let b = ChangeSetId::new();
        let change = ChangeId::new();
        graph
            .create(set(a), vec![element(a, change, "e")], &[])
            .unwrap();
        let err = graph
            .create(set(b), vec![element(b, change, "e")], &[a])
            .unwrap_err();
        assert!(matches!(err, GraphError::ChangeAlreadyAuthored { .. }));
    }

    // ----------------------------------------------------------
    // Edges & cycles
    // ----------------------------------------------------------

    #[test]
    fn add_edge_records_merge() {
        let (mut graph, ids, _) = linear();
        let other = ChangeSetId::new();
        graph.create(set(other), vec![], &[]).unwrap();
        graph.add_edge(other, ids[2]).unwrap();
        assert!(graph.parents_of(&ids[2]).contains(&other));
    }

    #[test]
    fn cycle_is_rejected() {
        let (mut graph, ids, _) = linear();
        // c is a descendant of a; an edge c -> a would close a cycle.
        let err = graph.add_edge(ids[2], ids[0]).unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
    }

    #[test]
    fn self_edge_is_rejected() {
        let (mut graph, ids, _) = linear();
        let err = graph.add_edge(ids[0], ids[0]).unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
    }

    #[test]
    fn duplicate_edge_is_a_noop() {
        let (mut graph, ids, _) = linear();
        graph.add_edge(ids[0], ids[1]).unwrap();
        assert_eq!(
            graph.parents_of(&ids[1]).iter().filter(|p| **p == ids[0]).count(),
            1
        );
    }

    // ----------------------------------------------------------
    // Ancestors
    // ----------------------------------------------------------

    #[test]
    fn direct_mode_returns_only_self() {
        let (graph, ids, _) = linear();
        let result = graph
            .ancestors_of(&ids[2], TraversalMode::Direct, None)
            .unwrap();
        assert_eq!(result, vec![ids[2]]);
    }

    #[test]
    fn recursive_mode_walks_to_root() {
        let (graph, ids, _) = linear();
        let result = graph
            .ancestors_of(&ids[2], TraversalMode::Recursive(None), None)
            .unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.contains(&ids[0]));
    }

    #[test]
    fn recursive_mode_respects_depth() {
        let (graph, ids, _) = linear();
        let result = graph
            .ancestors_of(&ids[2], TraversalMode::Recursive(Some(1)), None)
            .unwrap();
        assert_eq!(result, vec![ids[2], ids[1]]);
    }

    #[test]
    fn cancelled_traversal_returns_error() {
        let (graph, ids, _) = linear();
        let token = CancelToken::new();
        token.cancel();
        let err = graph
            .ancestors_of(&ids[2], TraversalMode::Recursive(None), Some(&token))
            .unwrap_err();
        assert!(matches!(err, GraphError::Cancelled));
    }

    #[test]
    fn diamond_ancestors_deduplicate_root() {
        let (graph, ids) = diamond();
        let result = graph
            .ancestors_of(&ids[3], TraversalMode::Recursive(None), None)
            .unwrap();
        assert_eq!(result.len(), 4);
    }

    // ----------------------------------------------------------
    // Symmetric difference
    // ----------------------------------------------------------

    #[test]
    fn symmetric_difference_of_equal_tips_is_empty() {
        let (graph, ids, _) = linear();
        let diff = graph.symmetric_difference(&ids[2], &ids[2], None).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn symmetric_difference_of_ancestor_and_descendant() {
        let (graph, ids, changes) = linear();
        let diff = graph.symmetric_difference(&ids[0], &ids[2], None).unwrap();
        // Changes 1 and 2 are only in c's history.
        assert_eq!(diff.len(), 2);
        assert!(diff.contains(&changes[1]));
        assert!(diff.contains(&changes[2]));
        assert!(!diff.contains(&changes[0]));
    }

    #[test]
    fn symmetric_difference_across_branches() {
        let mut graph = ChangeSetGraph::new();
        let root = ChangeSetId::new();
        let left = ChangeSetId::new();
        let right = ChangeSetId::new();
        let c_root = ChangeId::new();
        let c_left = ChangeId::new();
        let c_right = ChangeId::new();
        graph
            .create(set(root), vec![element(root, c_root, "e")], &[])
            .unwrap();
        graph
            .create(set(left), vec![element(left, c_left, "e")], &[root])
            .unwrap();
        graph
            .create(set(right), vec![element(right, c_right, "e")], &[root])
            .unwrap();

        let diff = graph.symmetric_difference(&left, &right, None).unwrap();
        assert_eq!(diff.len(), 2);
        assert!(diff.contains(&c_left));
        assert!(diff.contains(&c_right));
        assert!(!diff.contains(&c_root));
    }

    // ----------------------------------------------------------
    // Common ancestor
    // ----------------------------------------------------------

    #[test]
    fn common_ancestor_of_branches_is_fork_point() {
        let (graph, ids) = diamond();
        let lca = graph.common_ancestor(&ids[1], &ids[2]).unwrap();
        assert_eq!(lca, ids[0]);
    }

    #[test]
    fn common_ancestor_linear_is_older_set() {
        let (graph, ids, _) = linear();
        let lca = graph.common_ancestor(&ids[1], &ids[2]).unwrap();
        assert_eq!(lca, ids[1]);
    }

    #[test]
    fn common_ancestor_of_same_set_is_itself() {
        let (graph, ids, _) = linear();
        assert_eq!(graph.common_ancestor(&ids[1], &ids[1]), Some(ids[1]));
    }

    #[test]
    fn common_ancestor_of_unknown_is_none() {
        let (graph, ids, _) = linear();
        assert_eq!(graph.common_ancestor(&ids[0], &ChangeSetId::new()), None);
    }

    // ----------------------------------------------------------
    // Sync rows
    // ----------------------------------------------------------

    #[test]
    fn sync_rows_track_insertion_order() {
        let (graph, ids, _) = linear();
        let (sets, elements, edges) = graph.positions();
        assert_eq!(sets, 3);
        assert_eq!(elements, 3);
        assert_eq!(edges, 2);
        assert_eq!(graph.set_rows_from(1).len(), 2);
        assert_eq!(graph.set_rows_from(1)[0].id, ids[1]);
    }

    #[test]
    fn insert_rows_skip_duplicates() {
        let (mut graph, ids, changes) = linear();
        assert!(!graph.insert_set_row(set(ids[0])));
        assert!(!graph.insert_element_row(element(ids[0], changes[0], "e")));
        assert!(!graph
            .insert_edge_row(ChangeSetEdge {
                parent_id: ids[0],
                child_id: ids[1],
            })
            .unwrap());

        let fresh = ChangeSetId::new();
        assert!(graph.insert_set_row(set(fresh)));
        assert!(graph
            .insert_edge_row(ChangeSetEdge {
                parent_id: ids[2],
                child_id: fresh,
            })
            .unwrap());
    }

    #[test]
    fn insert_edge_row_refuses_cycles() {
        let (mut graph, ids, _) = linear();
        let err = graph
            .insert_edge_row(ChangeSetEdge {
                parent_id: ids[2],
                child_id: ids[0],
            })
            .unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
    }
}
