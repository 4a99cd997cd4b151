use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use quilt_cache::CacheRow;
use quilt_graph::{ChangeSet, ChangeSetElement};
use quilt_log::{Change, FileRow, NewChange};
use quilt_merge::{detect_conflicts, Conflict, MergeError, MergePolicy};
use quilt_plugin::{ChangePlugin, EntityPatch, PluginError, PluginRegistry};
use quilt_query::{execute, number_placeholders, plan, resolve_view, Query, ViewDef};
use quilt_refs::Version;
use quilt_sync::{ApplyStats, SyncClient};
use quilt_types::{CancelToken, ChangeId, ChangeSetId};

use crate::error::{EngineError, EngineResult};
use crate::state::EngineState;

/// Version tag at the front of every export blob.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// What one file-level recording produced.
#[derive(Debug, Default)]
pub struct RecordOutcome {
    pub changes: Vec<Change>,
    /// Plugins that failed during detection. Their failure never blocks
    /// the changes other plugins found.
    pub failures: Vec<PluginError>,
}

/// What a merge did.
#[derive(Clone, Debug)]
pub struct MergeOutcome {
    /// The change set the target version now points at; `None` when the
    /// merge was a no-op (tips already equal).
    pub merged: Option<ChangeSetId>,
    pub conflicts: Vec<Conflict>,
}

/// The embedded change-control engine.
///
/// All state sits behind one async write lock; plugins are registered
/// separately so exported state stays pure data. Operations clone the
/// state, mutate the clone, and swap on success.
pub struct Engine {
    state: Mutex<EngineState>,
    plugins: RwLock<PluginRegistry>,
}

impl Engine {
    /// A fresh engine with a current `main` version.
    pub fn new() -> EngineResult<Self> {
        Ok(Self::from_state(EngineState::bootstrap()?))
    }

    pub fn from_state(state: EngineState) -> Self {
        Self {
            state: Mutex::new(state),
            plugins: RwLock::new(PluginRegistry::new()),
        }
    }

    /// Restore an engine from an export blob. Plugins must be registered
    /// again; they are code, not state.
    pub fn import(bytes: &[u8]) -> EngineResult<Self> {
        let (version, state): (u32, EngineState) = bincode::deserialize(bytes)
            .map_err(|e| EngineError::Serialization(e.to_string()))?;
        if version != EXPORT_FORMAT_VERSION {
            return Err(EngineError::Serialization(format!(
                "unsupported export format version {version}"
            )));
        }
        Ok(Self::from_state(state))
    }

    /// Serialize the full state to a versioned binary blob.
    pub async fn export(&self) -> EngineResult<Vec<u8>> {
        let state = self.state.lock().await;
        bincode::serialize(&(EXPORT_FORMAT_VERSION, &*state))
            .map_err(|e| EngineError::Serialization(e.to_string()))
    }

    /// Run `f` against a working copy; swap it in only on success.
    async fn transact<T>(
        &self,
        f: impl FnOnce(&mut EngineState, &PluginRegistry) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let plugins = self.plugins.read().unwrap().clone();
        let mut guard = self.state.lock().await;
        let mut working = guard.clone();
        let value = f(&mut working, &plugins)?;
        *guard = working;
        Ok(value)
    }

    // ---------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------

    pub fn register_plugin(&self, plugin: Arc<dyn ChangePlugin>) -> EngineResult<()> {
        self.plugins.write().unwrap().register(plugin)?;
        Ok(())
    }

    pub async fn register_schema(
        &self,
        key: &str,
        version: &str,
        definition: &Value,
    ) -> EngineResult<()> {
        self.transact(|state, _| Ok(state.schemas.register(key, version, definition)?))
            .await
    }

    pub async fn define_view(&self, view: ViewDef) -> EngineResult<()> {
        self.transact(|state, _| Ok(state.views.define(view)?))
            .await
    }

    // ---------------------------------------------------------------
    // Recording changes
    // ---------------------------------------------------------------

    /// Store a file's new bytes and let every matching plugin detect
    /// entity-level changes against the previous bytes. Detected changes
    /// land in the pending buffer.
    pub async fn record_file(&self, file: FileRow) -> EngineResult<RecordOutcome> {
        self.transact(move |state, plugins| {
            state.cache.mark_stale();
            let before = state.files.get(&file.id).ok().cloned();
            state.files.upsert(file.clone());

            let report = plugins.detect_changes(before.as_ref(), &file);
            let mut changes = Vec::new();
            for detection in report.detections {
                let change = state.log.record(
                    &mut state.snapshots,
                    &state.schemas,
                    NewChange {
                        entity_id: detection.change.entity_id,
                        file_id: file.id.clone(),
                        schema_key: detection.change.schema_key,
                        schema_version: detection.change.schema_version,
                        plugin_key: detection.plugin_key,
                        content: detection.change.content,
                        parent_id: None,
                    },
                )?;
                changes.push(change);
            }
            Ok(RecordOutcome {
                changes,
                failures: report.failures,
            })
        })
        .await
    }

    /// Record one change directly, bypassing plugin detection. For
    /// host-managed entities.
    pub async fn record(&self, input: NewChange) -> EngineResult<Change> {
        self.transact(move |state, _| {
            state.cache.mark_stale();
            Ok(state
                .log
                .record(&mut state.snapshots, &state.schemas, input)?)
        })
        .await
    }

    pub async fn pending_changes(&self) -> Vec<Change> {
        self.state.lock().await.log.pending().to_vec()
    }

    pub async fn discard_pending(&self) {
        self.state.lock().await.log.discard_pending();
    }

    /// Seal the pending buffer into a change set on the current version.
    pub async fn commit(
        &self,
        metadata: BTreeMap<String, String>,
    ) -> EngineResult<ChangeSetId> {
        self.transact(move |state, _| {
            let current = state
                .versions
                .current()
                .cloned()
                .ok_or(EngineError::NoCurrentVersion)?;
            let sealed = state.log.seal_pending();
            if sealed.is_empty() {
                return Err(EngineError::EmptyCommit);
            }

            state.cache.mark_stale();
            let set = ChangeSet {
                id: ChangeSetId::new(),
                metadata,
            };
            let set_id = set.id;
            let elements = sealed
                .iter()
                .map(|c| ChangeSetElement::from_change(set_id, c))
                .collect();
            state
                .graph
                .create(set, elements, &[current.change_set_id])?;
            state.versions.advance(&current.id, set_id)?;
            info!(
                change_set = %set_id.short_id(),
                changes = sealed.len(),
                version = %current.name,
                "committed change set"
            );
            Ok(set_id)
        })
        .await
    }

    // ---------------------------------------------------------------
    // Versions
    // ---------------------------------------------------------------

    pub async fn current_version(&self) -> EngineResult<Version> {
        self.state
            .lock()
            .await
            .versions
            .current()
            .cloned()
            .ok_or(EngineError::NoCurrentVersion)
    }

    /// Branch off the current version. Only the pointer is copied.
    pub async fn create_version(&self, name: &str) -> EngineResult<Version> {
        let name = name.to_string();
        self.transact(move |state, _| {
            let current = state
                .versions
                .current()
                .cloned()
                .ok_or(EngineError::NoCurrentVersion)?;
            Ok(state.versions.create_from(&current.id, &name)?)
        })
        .await
    }

    /// Switch the current-version context by name. Refused while changes
    /// are pending: they belong to the version they were recorded under.
    pub async fn switch_to(&self, name: &str) -> EngineResult<Version> {
        let name = name.to_string();
        self.transact(move |state, _| {
            if !state.log.pending().is_empty() {
                return Err(EngineError::PendingChanges);
            }
            let version = state
                .versions
                .get_by_name(&name)
                .cloned()
                .ok_or_else(|| EngineError::UnknownVersionName(name.clone()))?;
            state.versions.switch_to(&version.id)?;
            debug!(version = %version.name, "switched current version");
            Ok(version)
        })
        .await
    }

    pub async fn delete_version(&self, name: &str) -> EngineResult<bool> {
        let name = name.to_string();
        self.transact(move |state, _| {
            let Some(version) = state.versions.get_by_name(&name).cloned() else {
                return Ok(false);
            };
            Ok(state.versions.delete(&version.id)?)
        })
        .await
    }

    // ---------------------------------------------------------------
    // Merge and conflicts
    // ---------------------------------------------------------------

    /// Merge `source` into `target`.
    ///
    /// Equal tips are a no-op; a target whose tip is an ancestor of the
    /// source fast-forwards without a merge set. Otherwise a merge change
    /// set with both parents is created. Under [`MergePolicy::Fail`] any
    /// conflict aborts the merge; under [`MergePolicy::Stage`] the merge
    /// completes and conflicts are staged for later resolution.
    pub async fn merge(
        &self,
        source: &str,
        target: &str,
        policy: MergePolicy,
    ) -> EngineResult<MergeOutcome> {
        let source = source.to_string();
        let target = target.to_string();
        self.transact(move |state, plugins| {
            let source = state
                .versions
                .get_by_name(&source)
                .cloned()
                .ok_or_else(|| EngineError::UnknownVersionName(source.clone()))?;
            let target = state
                .versions
                .get_by_name(&target)
                .cloned()
                .ok_or_else(|| EngineError::UnknownVersionName(target.clone()))?;

            if source.change_set_id == target.change_set_id {
                return Ok(MergeOutcome {
                    merged: None,
                    conflicts: Vec::new(),
                });
            }

            let conflicts = detect_conflicts(
                &state.graph,
                &state.log,
                &state.snapshots,
                plugins,
                &source.change_set_id,
                &target.change_set_id,
                None,
            )?;
            if !conflicts.is_empty() && policy == MergePolicy::Fail {
                return Err(MergeError::UnresolvedConflicts(conflicts.len()).into());
            }

            state.cache.mark_stale();

            // Fast-forward when the target has no changes of its own.
            let merged = if state
                .graph
                .common_ancestor(&target.change_set_id, &source.change_set_id)
                == Some(target.change_set_id)
            {
                state.versions.advance(&target.id, source.change_set_id)?;
                source.change_set_id
            } else {
                let set = ChangeSet {
                    id: ChangeSetId::new(),
                    metadata: BTreeMap::from([(
                        "merge-source".to_string(),
                        source.name.clone(),
                    )]),
                };
                let set_id = set.id;
                state.graph.create(
                    set,
                    Vec::new(),
                    &[target.change_set_id, source.change_set_id],
                )?;
                state.versions.advance(&target.id, set_id)?;
                set_id
            };

            for conflict in &conflicts {
                state.conflicts.stage(conflict.clone());
            }
            info!(
                source = %source.name,
                target = %target.name,
                merged = %merged.short_id(),
                conflicts = conflicts.len(),
                "merged versions"
            );
            Ok(MergeOutcome {
                merged: Some(merged),
                conflicts,
            })
        })
        .await
    }

    /// Detect conflicts between two versions without merging.
    pub async fn detect_conflicts(
        &self,
        source: &str,
        target: &str,
    ) -> EngineResult<Vec<Conflict>> {
        let plugins = self.plugins.read().unwrap().clone();
        let state = self.state.lock().await;
        let source = state
            .versions
            .get_by_name(source)
            .ok_or_else(|| EngineError::UnknownVersionName(source.to_string()))?;
        let target = state
            .versions
            .get_by_name(target)
            .ok_or_else(|| EngineError::UnknownVersionName(target.to_string()))?;
        Ok(detect_conflicts(
            &state.graph,
            &state.log,
            &state.snapshots,
            &plugins,
            &source.change_set_id,
            &target.change_set_id,
            None,
        )?)
    }

    pub async fn unresolved_conflicts(&self) -> Vec<Conflict> {
        self.state
            .lock()
            .await
            .conflicts
            .unresolved()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Resolve a staged conflict by selecting the winning change.
    ///
    /// The winner's content is written back into the file through its
    /// plugin (when one is registered), recorded as a new change with the
    /// winner as parent, and sealed into a change set on the current
    /// version. All of it lands atomically or not at all.
    pub async fn resolve_conflict(
        &self,
        a: ChangeId,
        b: ChangeId,
        selected: ChangeId,
    ) -> EngineResult<Change> {
        self.transact(move |state, plugins| {
            if !state.log.pending().is_empty() {
                return Err(EngineError::PendingChanges);
            }
            let current = state
                .versions
                .current()
                .cloned()
                .ok_or(EngineError::NoCurrentVersion)?;

            state.cache.mark_stale();
            state.conflicts.resolve_by_selecting(&a, &b, &selected)?;

            let winner = state.log.get(&selected)?.clone();
            let content = if winner.is_deletion() {
                None
            } else {
                state.snapshots.read(&winner.snapshot_id)?
            };

            if let Ok(plugin) = plugins.get(&winner.plugin_key) {
                let file = state.files.get(&winner.file_id)?.clone();
                let patch = EntityPatch {
                    entity_id: winner.entity_id.clone(),
                    schema_key: winner.schema_key.clone(),
                    content: content.clone(),
                };
                let bytes = plugin.apply_changes(&file, std::slice::from_ref(&patch))?;
                state.files.set_data(&winner.file_id, bytes)?;
            }

            let resolution = state.log.record(
                &mut state.snapshots,
                &state.schemas,
                NewChange {
                    entity_id: winner.entity_id,
                    file_id: winner.file_id,
                    schema_key: winner.schema_key,
                    schema_version: winner.schema_version,
                    plugin_key: winner.plugin_key,
                    content,
                    parent_id: Some(selected),
                },
            )?;
            let sealed = state.log.seal_pending();

            let set = ChangeSet {
                id: ChangeSetId::new(),
                metadata: BTreeMap::from([(
                    "resolves".to_string(),
                    selected.to_string(),
                )]),
            };
            let set_id = set.id;
            let elements = sealed
                .iter()
                .map(|c| ChangeSetElement::from_change(set_id, c))
                .collect();
            state
                .graph
                .create(set, elements, &[current.change_set_id])?;
            state.versions.advance(&current.id, set_id)?;
            info!(selected = %selected.short_id(), "resolved conflict");
            Ok(resolution)
        })
        .await
    }

    // ---------------------------------------------------------------
    // Query and state
    // ---------------------------------------------------------------

    /// Rebuild the state cache from the log and graph. `scope` limits the
    /// pass to one schema's table; only a full refresh restores freshness.
    pub async fn refresh_cache(
        &self,
        scope: Option<&str>,
        cancel: Option<&CancelToken>,
    ) -> EngineResult<()> {
        let mut guard = self.state.lock().await;
        let mut working = guard.clone();
        let state = &mut working;
        state.cache.rebuild(
            &state.log,
            &state.snapshots,
            &state.graph,
            &state.versions,
            scope,
            cancel,
        )?;
        *guard = working;
        Ok(())
    }

    /// Run a query under the current version.
    ///
    /// The rewriter numbers placeholders and inlines views; the planner
    /// scans the cache when fresh and replays the log when stale.
    pub async fn query(&self, query: Query, params: &[Value]) -> EngineResult<Vec<CacheRow>> {
        let state = self.state.lock().await;
        let current = state
            .versions
            .current()
            .ok_or(EngineError::NoCurrentVersion)?;

        let mut query = query;
        number_placeholders(&mut query);
        let query = resolve_view(query, &state.views)?;
        let planned = plan(query, state.cache.is_fresh());
        Ok(execute(
            &planned,
            params,
            &current.id,
            &state.cache,
            &state.log,
            &state.snapshots,
            &state.graph,
            &state.versions,
            None,
        )?)
    }

    /// Read one entity's current content under the current version.
    pub async fn read_entity(
        &self,
        schema_key: &str,
        file_id: &str,
        entity_id: &str,
    ) -> EngineResult<Option<Value>> {
        let query = Query::table(schema_key)
            .filter(quilt_query::Predicate::eq(
                "file_id",
                quilt_query::Operand::Literal(Value::String(file_id.to_string())),
            ))
            .filter(quilt_query::Predicate::eq(
                "entity_id",
                quilt_query::Operand::Literal(Value::String(entity_id.to_string())),
            ));
        let rows = self.query(query, &[]).await?;
        Ok(rows.into_iter().next().map(|r| r.content))
    }

    pub async fn file(&self, id: &str) -> EngineResult<FileRow> {
        Ok(self.state.lock().await.files.get(id)?.clone())
    }

    // ---------------------------------------------------------------
    // Sync
    // ---------------------------------------------------------------

    /// Pull remote rows into this engine's stores.
    ///
    /// Applies into a working copy and swaps on success, like every other
    /// mutation; a batch that fails partway leaves the local state exactly
    /// as it was. (`transact` itself is sync, so the copy is made by hand.)
    pub async fn pull(&self, client: &mut SyncClient) -> EngineResult<ApplyStats> {
        let mut guard = self.state.lock().await;
        let mut working = guard.clone();
        working.cache.mark_stale();
        let state = &mut working;
        let stats = client
            .pull(&mut state.snapshots, &mut state.log, &mut state.graph)
            .await?;
        *guard = working;
        Ok(stats)
    }

    /// Push local rows the remote has not acknowledged.
    pub async fn push(&self, client: &mut SyncClient) -> EngineResult<()> {
        let state = self.state.lock().await;
        Ok(client
            .push(&state.snapshots, &state.log, &state.graph)
            .await?)
    }
}
