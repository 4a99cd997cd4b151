use serde_json::Value;

use quilt_cache::{CacheRow, StateCache};
use quilt_graph::ChangeSetGraph;
use quilt_log::ChangeLog;
use quilt_refs::VersionStore;
use quilt_store::SnapshotStore;
use quilt_types::{CancelToken, VersionId};

use crate::error::{QueryError, QueryResult};
use crate::ir::{Comparison, Operand, Predicate, Source};
use crate::plan::{QueryPlan, Strategy};

/// Execute a planned query under one version.
///
/// `CacheScan` reads the materialized cache; `LogReplay` materializes a
/// scratch cache from the log and graph. The two strategies return the
/// same rows for the same inputs.
#[allow(clippy::too_many_arguments)]
pub fn execute(
    plan: &QueryPlan,
    params: &[Value],
    version_id: &VersionId,
    cache: &StateCache,
    log: &ChangeLog,
    store: &SnapshotStore,
    graph: &ChangeSetGraph,
    versions: &VersionStore,
    cancel: Option<&CancelToken>,
) -> QueryResult<Vec<CacheRow>> {
    let schema_key = match &plan.query.source {
        Source::Table(key) => key,
        Source::View(name) => return Err(QueryError::UnknownView(name.clone())),
    };

    let rows: Vec<CacheRow> = match plan.strategy {
        Strategy::CacheScan => cache
            .scan(version_id, schema_key)
            .into_iter()
            .cloned()
            .collect(),
        Strategy::LogReplay => {
            replay_rows(schema_key, version_id, log, store, graph, versions, cancel)?
        }
    };

    let mut result = Vec::new();
    for row in rows {
        if matches_all(&plan.query.predicates, &row, params)? {
            result.push(row);
        }
    }
    Ok(result)
}

/// The log-replay oracle: materialize one table under one version straight
/// from the log and graph, bypassing the shared cache.
pub fn replay_rows(
    schema_key: &str,
    version_id: &VersionId,
    log: &ChangeLog,
    store: &SnapshotStore,
    graph: &ChangeSetGraph,
    versions: &VersionStore,
    cancel: Option<&CancelToken>,
) -> QueryResult<Vec<CacheRow>> {
    let mut scratch = StateCache::new();
    scratch.rebuild(log, store, graph, versions, Some(schema_key), cancel)?;
    Ok(scratch
        .scan(version_id, schema_key)
        .into_iter()
        .cloned()
        .collect())
}

fn matches_all(predicates: &[Predicate], row: &CacheRow, params: &[Value]) -> QueryResult<bool> {
    for predicate in predicates {
        let actual = column_value(row, &predicate.column);
        let expected = operand_value(&predicate.operand, params)?;
        let equal = actual == *expected;
        let pass = match predicate.op {
            Comparison::Eq => equal,
            Comparison::Ne => !equal,
        };
        if !pass {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `entity_id` and `file_id` address row identity; any other column reads a
/// top-level content field, with missing fields comparing as null.
fn column_value(row: &CacheRow, column: &str) -> Value {
    match column {
        "entity_id" => Value::String(row.entity_id.clone()),
        "file_id" => Value::String(row.file_id.clone()),
        field => row.content.get(field).cloned().unwrap_or(Value::Null),
    }
}

fn operand_value<'a>(operand: &'a Operand, params: &'a [Value]) -> QueryResult<&'a Value> {
    match operand {
        Operand::Literal(value) => Ok(value),
        Operand::Placeholder(None) => Err(QueryError::UnnumberedPlaceholder),
        Operand::Placeholder(Some(ordinal)) => params
            .get((*ordinal as usize).saturating_sub(1))
            .ok_or(QueryError::MissingParameter(*ordinal)),
    }
}
