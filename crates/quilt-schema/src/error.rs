use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema {key}@{version} is already registered with a different definition")]
    SchemaConflict { key: String, version: String },

    #[error("unknown schema: {key}@{version}")]
    UnknownSchema { key: String, version: String },

    #[error("value does not conform to schema {key}@{version}: {reason}")]
    Validation {
        key: String,
        version: String,
        reason: String,
    },

    #[error("malformed schema definition for {key}@{version}: {reason}")]
    MalformedDefinition {
        key: String,
        version: String,
        reason: String,
    },

    #[error("store error: {0}")]
    Store(#[from] quilt_store::StoreError),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
