use quilt_types::ChangeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("unknown change: {0}")]
    UnknownChange(ChangeId),

    #[error("parent change does not exist: {0}")]
    UnknownParentChange(ChangeId),

    #[error("unknown file: {0}")]
    UnknownFile(String),

    #[error(transparent)]
    Schema(#[from] quilt_schema::SchemaError),

    #[error(transparent)]
    Store(#[from] quilt_store::StoreError),
}

pub type LogResult<T> = Result<T, LogError>;
