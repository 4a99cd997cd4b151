//! The change-set graph: a DAG of sealed commits.
//!
//! Each [`ChangeSet`] groups changes atomically; edges record parentage,
//! with multiple parents for merges and multiple children for branches.
//! The graph is acyclic by construction — a change set's parents must exist
//! before it does — and explicit edge insertion re-checks reachability so a
//! later merge edge can never close a cycle.

pub mod error;
pub mod graph;
pub mod types;

pub use error::{GraphError, GraphResult};
pub use graph::ChangeSetGraph;
pub use types::{ChangeSet, ChangeSetEdge, ChangeSetElement, TraversalMode};
