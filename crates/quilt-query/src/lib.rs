//! Query layer for Quilt.
//!
//! Queries are a small typed IR, not strings: a source (entity table or
//! named view), a conjunction of predicates, and positional placeholders.
//! The rewriter numbers placeholders and inlines views, then the planner
//! picks a strategy: scan the materialized cache when it is fresh, or
//! replay from the change log when it is not. Both strategies must return
//! identical rows for the same inputs.

pub mod error;
pub mod exec;
pub mod ir;
pub mod plan;
pub mod rewrite;
pub mod view;

pub use error::{QueryError, QueryResult};
pub use exec::{execute, replay_rows};
pub use ir::{Comparison, Operand, Predicate, Query, Source};
pub use plan::{plan, QueryPlan, Strategy};
pub use rewrite::{number_placeholders, resolve_view};
pub use view::{ViewCatalog, ViewDef};
