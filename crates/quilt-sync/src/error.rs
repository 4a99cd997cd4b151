use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote store not found: {0}")]
    UnknownStore(String),

    #[error(transparent)]
    Graph(#[from] quilt_graph::GraphError),
}

pub type SyncResult<T> = Result<T, SyncError>;
