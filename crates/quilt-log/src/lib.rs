//! Append-only change log for Quilt.
//!
//! A [`Change`] records one observed mutation of one entity: which file it
//! lives in, which schema describes it, which plugin produced it, and the
//! content-addressed snapshot of its new value. Changes are validated
//! against the schema registry before admission and buffered as *pending*
//! until a change set seals them — either every change in a commit becomes
//! visible together, or none do.

pub mod change;
pub mod error;
pub mod file;
pub mod log;

pub use change::{Change, EntityKey, NewChange};
pub use error::{LogError, LogResult};
pub use file::{FileRow, FileStore};
pub use log::ChangeLog;
