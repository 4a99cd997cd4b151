//! Conflict detection and resolution for Quilt.
//!
//! A conflict is a pair of changes to the same entity that diverged from a
//! common ancestor with different content. Detection is scoped to the
//! symmetric difference of the two histories, so shared prefix changes are
//! never compared. Convergent edits (both sides arrived at the same value)
//! are not conflicts.

pub mod detect;
pub mod error;
pub mod store;
pub mod types;

pub use detect::detect_conflicts;
pub use error::{MergeError, MergeResult};
pub use store::ConflictStore;
pub use types::{Conflict, MergePolicy};
