use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use quilt_protocol::{codes, ErrorBody};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("store not found: {0}")]
    StoreNotFound(String),

    #[error("malformed push: {0}")]
    MalformedPush(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::StoreNotFound(_) => (StatusCode::NOT_FOUND, codes::STORE_NOT_FOUND),
            ServerError::MalformedPush(_) => (StatusCode::BAD_REQUEST, codes::MALFORMED_REQUEST),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL),
        };
        let body = ErrorBody::new(code, self.to_string());
        (status, Json(body)).into_response()
    }
}
