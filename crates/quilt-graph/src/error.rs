use quilt_types::{ChangeId, ChangeSetId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown parent change set: {0}")]
    UnknownParent(ChangeSetId),

    #[error("unknown change set: {0}")]
    UnknownChangeSet(ChangeSetId),

    #[error("duplicate change set: {0}")]
    DuplicateChangeSet(ChangeSetId),

    #[error("change {change} is already authored by change set {owner}")]
    ChangeAlreadyAuthored {
        change: ChangeId,
        owner: ChangeSetId,
    },

    #[error("edge {parent} -> {child} would create a cycle")]
    CycleDetected {
        parent: ChangeSetId,
        child: ChangeSetId,
    },

    #[error("traversal cancelled")]
    Cancelled,
}

pub type GraphResult<T> = Result<T, GraphError>;
