use async_trait::async_trait;

use crate::error::SyncResult;
use crate::types::{SyncRows, VectorClock};

/// How a client reaches a remote store. The HTTP implementation lives with
/// the protocol crate; tests use in-process implementations.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Ask the remote for every row past `clock`. Returns the rows and the
    /// remote's clock at response time.
    async fn pull(&self, store: &str, clock: &VectorClock) -> SyncResult<(SyncRows, VectorClock)>;

    /// Offer rows to the remote. The remote skips rows it already has.
    async fn push(&self, store: &str, rows: &SyncRows) -> SyncResult<()>;
}
