use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use quilt_graph::ChangeSetGraph;
use quilt_log::{Change, ChangeLog};
use quilt_refs::VersionStore;
use quilt_store::SnapshotStore;
use quilt_types::{CancelToken, ChangeSetId, VersionId};

use crate::error::{CacheError, CacheResult};
use crate::types::{CacheKey, CacheRow};

/// Per-version materialized entity state.
///
/// The cache is either fresh or stale, never partially updated. Callers
/// must mark it stale *before* mutating the log, graph, or version store,
/// so a crash between the two leaves the conservative state behind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateCache {
    fresh: bool,
    rows: BTreeMap<CacheKey, CacheRow>,
}

impl Default for StateCache {
    fn default() -> Self {
        // An empty cache is trivially consistent with empty stores.
        Self {
            fresh: true,
            rows: BTreeMap::new(),
        }
    }
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Invalidate the cache. Call before any mutation of the underlying
    /// stores.
    pub fn mark_stale(&mut self) {
        self.fresh = false;
    }

    /// Drop all rows and invalidate.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.fresh = false;
    }

    /// Read one entity's materialized content under a version.
    pub fn read(
        &self,
        version_id: &VersionId,
        schema_key: &str,
        file_id: &str,
        entity_id: &str,
    ) -> Option<&CacheRow> {
        self.rows.get(&CacheKey {
            version_id: *version_id,
            schema_key: schema_key.to_string(),
            file_id: file_id.to_string(),
            entity_id: entity_id.to_string(),
        })
    }

    /// All rows of one schema under a version, in key order.
    pub fn scan(&self, version_id: &VersionId, schema_key: &str) -> Vec<&CacheRow> {
        self.rows
            .values()
            .filter(|r| r.version_id == *version_id && r.schema_key == schema_key)
            .collect()
    }

    /// All rows under a version and file, in key order.
    pub fn scan_file(&self, version_id: &VersionId, file_id: &str) -> Vec<&CacheRow> {
        self.rows
            .values()
            .filter(|r| r.version_id == *version_id && r.file_id == file_id)
            .collect()
    }

    /// Rebuild materialized rows from the log and graph.
    ///
    /// For every version, the winning change per entity is the one authored
    /// by the ancestor change set nearest to the version's tip; ties within
    /// one depth are broken by creation time, then change id. Deletions
    /// produce no row. The rebuild is a pure function of its inputs.
    ///
    /// `scope` limits the work to one schema's table; a scoped rebuild
    /// replaces only that schema's rows and never restores freshness, since
    /// the other tables may still be out of date. A full rebuild (`None`)
    /// replaces everything and marks the cache fresh.
    pub fn rebuild(
        &mut self,
        log: &ChangeLog,
        store: &SnapshotStore,
        graph: &ChangeSetGraph,
        versions: &VersionStore,
        scope: Option<&str>,
        cancel: Option<&CancelToken>,
    ) -> CacheResult<()> {
        let mut rows = BTreeMap::new();
        for version in versions.list() {
            materialize_version(
                &mut rows,
                version.id,
                &version.change_set_id,
                log,
                store,
                graph,
                scope,
                cancel,
            )?;
        }
        debug!(
            rows = rows.len(),
            scope = scope.unwrap_or("*"),
            "rebuilt state cache"
        );
        match scope {
            None => {
                self.rows = rows;
                self.fresh = true;
            }
            Some(schema_key) => {
                self.rows.retain(|key, _| key.schema_key != schema_key);
                self.rows.append(&mut rows);
            }
        }
        Ok(())
    }
}

/// Winner bookkeeping during one version's walk.
struct Candidate<'a> {
    depth: usize,
    change: &'a Change,
}

impl Candidate<'_> {
    /// Nearer depth wins; within a depth, later creation wins, then the
    /// larger id.
    fn beats(&self, other: &Self) -> bool {
        match self.depth.cmp(&other.depth) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => {
                (self.change.created_at, self.change.id)
                    > (other.change.created_at, other.change.id)
            }
        }
    }
}

fn materialize_version(
    rows: &mut BTreeMap<CacheKey, CacheRow>,
    version_id: VersionId,
    tip: &ChangeSetId,
    log: &ChangeLog,
    store: &SnapshotStore,
    graph: &ChangeSetGraph,
    scope: Option<&str>,
    cancel: Option<&CancelToken>,
) -> CacheResult<()> {
    if !graph.contains(tip) {
        // A version may point at a change set that has not synced yet.
        return Ok(());
    }

    // Depth-annotated BFS over the tip's ancestry.
    let mut winners: BTreeMap<CacheKey, Candidate<'_>> = BTreeMap::new();
    let mut visited: HashSet<ChangeSetId> = HashSet::new();
    visited.insert(*tip);
    let mut queue: VecDeque<(ChangeSetId, usize)> = VecDeque::new();
    queue.push_back((*tip, 0));

    while let Some((set, depth)) = queue.pop_front() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(CacheError::Cancelled);
        }
        for element in graph.elements_of(&set) {
            if scope.is_some_and(|schema_key| element.schema_key != schema_key) {
                continue;
            }
            let change = log.get(&element.change_id)?;
            let key = CacheKey {
                version_id,
                schema_key: element.schema_key.clone(),
                file_id: element.file_id.clone(),
                entity_id: element.entity_id.clone(),
            };
            let candidate = Candidate { depth, change };
            match winners.get(&key) {
                Some(current) if !candidate.beats(current) => {}
                _ => {
                    winners.insert(key, candidate);
                }
            }
        }
        for parent in graph.parents_of(&set) {
            if visited.insert(*parent) {
                queue.push_back((*parent, depth + 1));
            }
        }
    }

    for (key, winner) in winners {
        if winner.change.is_deletion() {
            continue;
        }
        let content = store
            .read(&winner.change.snapshot_id)?
            .unwrap_or(serde_json::Value::Null);
        rows.insert(
            key.clone(),
            CacheRow {
                version_id: key.version_id,
                schema_key: key.schema_key,
                file_id: key.file_id,
                entity_id: key.entity_id,
                change_id: winner.change.id,
                content,
            },
        );
    }
    Ok(())
}
