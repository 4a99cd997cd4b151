//! Peer synchronization for Quilt.
//!
//! Every replicated table is append-only and insertion-ordered, so a
//! per-table row count is an exact progress marker. A [`VectorClock`] holds
//! one position per table; a peer pulls by sending its clock and receiving
//! the rows past each position, and pushes by sending the rows the remote
//! has not acknowledged. Row application is idempotent: already-present
//! rows are skipped, never rewritten.

pub mod client;
pub mod diff;
pub mod error;
pub mod transport;
pub mod types;

pub use client::SyncClient;
pub use diff::{apply_rows, local_clock, rows_since, ApplyStats};
pub use error::{SyncError, SyncResult};
pub use transport::SyncTransport;
pub use types::{SyncRows, VectorClock};
