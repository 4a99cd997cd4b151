//! Materialized state cache for Quilt.
//!
//! Queries against entity state should not replay the change log every
//! time. The [`StateCache`] holds, per version, the latest visible content
//! of every live entity. It is an acceleration structure only: any mutation
//! of the underlying stores marks it stale *before* the mutation lands, and
//! a full rebuild from the log and graph restores it. Rebuilding twice from
//! the same inputs yields identical rows.

pub mod cache;
pub mod error;
pub mod types;

pub use cache::StateCache;
pub use error::{CacheError, CacheResult};
pub use types::{CacheKey, CacheRow};
