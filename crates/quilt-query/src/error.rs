use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown view: {0}")]
    UnknownView(String),

    #[error("view name already defined: {0}")]
    ViewAlreadyDefined(String),

    #[error("placeholder ${0} has no bound parameter")]
    MissingParameter(u32),

    #[error("placeholder without an ordinal; run the numbering pass first")]
    UnnumberedPlaceholder,

    #[error(transparent)]
    Cache(#[from] quilt_cache::CacheError),
}

pub type QueryResult<T> = Result<T, QueryError>;
