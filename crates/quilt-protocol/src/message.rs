use serde::{Deserialize, Serialize};

use quilt_sync::{SyncRows, VectorClock};

pub const PROTOCOL_VERSION: u32 = 1;

/// Client clock sent to `pull`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PullRequest {
    pub clock: VectorClock,
}

/// Rows past the client's clock, plus the server's clock at response time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PullResponse {
    pub rows: SyncRows,
    pub clock: VectorClock,
}

/// Rows offered to the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PushRequest {
    pub rows: SyncRows,
}

/// How the server disposed of a push.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PushResponse {
    pub inserted: usize,
    pub skipped: usize,
    pub clock: VectorClock,
}
