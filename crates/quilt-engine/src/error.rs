use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no current version selected")]
    NoCurrentVersion,

    #[error("unknown version name: {0}")]
    UnknownVersionName(String),

    #[error("nothing to commit")]
    EmptyCommit,

    #[error("operation requires an empty pending buffer; commit or discard first")]
    PendingChanges,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Schema(#[from] quilt_schema::SchemaError),

    #[error(transparent)]
    Store(#[from] quilt_store::StoreError),

    #[error(transparent)]
    Log(#[from] quilt_log::LogError),

    #[error(transparent)]
    Graph(#[from] quilt_graph::GraphError),

    #[error(transparent)]
    Ref(#[from] quilt_refs::RefError),

    #[error(transparent)]
    Plugin(#[from] quilt_plugin::PluginError),

    #[error(transparent)]
    Merge(#[from] quilt_merge::MergeError),

    #[error(transparent)]
    Cache(#[from] quilt_cache::CacheError),

    #[error(transparent)]
    Query(#[from] quilt_query::QueryError),

    #[error(transparent)]
    Sync(#[from] quilt_sync::SyncError),
}

pub type EngineResult<T> = Result<T, EngineError>;
