use quilt_types::SnapshotId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot not found: {0}")]
    NotFound(SnapshotId),

    #[error("stored bytes for {id} are not valid JSON: {reason}")]
    CorruptSnapshot { id: SnapshotId, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
