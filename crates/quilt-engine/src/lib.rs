//! The Quilt engine.
//!
//! One facade over the component stores: snapshots, schemas, the change
//! log, the change-set graph, versions, conflicts, the state cache, and the
//! query layer. All mutation goes through a single write lock, and every
//! operation is transactional: it runs against a working copy of the state
//! that only replaces the shared state on success.

pub mod engine;
pub mod error;
pub mod state;

pub use engine::{Engine, MergeOutcome, RecordOutcome, EXPORT_FORMAT_VERSION};
pub use error::{EngineError, EngineResult};
pub use state::EngineState;
