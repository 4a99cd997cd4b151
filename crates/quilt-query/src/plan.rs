use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ir::Query;

/// How the executor will produce rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Scan the materialized state cache.
    CacheScan,
    /// Replay entity state from the change log and graph.
    LogReplay,
}

/// A planned query, ready for binding and execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryPlan {
    pub strategy: Strategy,
    pub query: Query,
}

/// Pick the execution strategy. The cache is only usable while fresh;
/// anything else replays from the log.
pub fn plan(query: Query, cache_fresh: bool) -> QueryPlan {
    let strategy = if cache_fresh {
        Strategy::CacheScan
    } else {
        Strategy::LogReplay
    };
    debug!(?strategy, "planned query");
    QueryPlan { strategy, query }
}
