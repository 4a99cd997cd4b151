use quilt_types::ChangeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no unresolved conflict involves changes {0} and {1}")]
    ConflictNotFound(ChangeId, ChangeId),

    #[error("selected change {0} is not a party to the conflict")]
    SelectionNotInConflict(ChangeId),

    #[error("merge refused: {0} unresolved conflict(s)")]
    UnresolvedConflicts(usize),

    #[error(transparent)]
    Graph(#[from] quilt_graph::GraphError),

    #[error(transparent)]
    Log(#[from] quilt_log::LogError),

    #[error(transparent)]
    Store(#[from] quilt_store::StoreError),
}

pub type MergeResult<T> = Result<T, MergeError>;
