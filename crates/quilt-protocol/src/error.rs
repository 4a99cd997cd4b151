use serde::{Deserialize, Serialize};

/// Stable numeric error codes carried in [`ErrorBody`].
pub mod codes {
    pub const STORE_NOT_FOUND: u32 = 404;
    pub const MALFORMED_REQUEST: u32 = 400;
    pub const INTERNAL: u32 = 500;
}

/// JSON error payload returned by every failing endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u32,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
