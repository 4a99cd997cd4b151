use quilt_types::VersionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefError {
    #[error("unknown version: {0}")]
    UnknownVersion(VersionId),

    #[error("version name already in use: {0}")]
    NameTaken(String),

    #[error("invalid version name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("cannot delete the current version: {0}")]
    DeleteCurrentVersion(String),
}

pub type RefResult<T> = Result<T, RefError>;
