use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache rebuild cancelled")]
    Cancelled,

    #[error(transparent)]
    Graph(#[from] quilt_graph::GraphError),

    #[error(transparent)]
    Log(#[from] quilt_log::LogError),

    #[error(transparent)]
    Store(#[from] quilt_store::StoreError),
}

pub type CacheResult<T> = Result<T, CacheError>;
