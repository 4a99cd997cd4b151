//! Rewrite passes run before planning.

use crate::error::QueryResult;
use crate::ir::{Operand, Query, Source};
use crate::view::ViewCatalog;

/// Assign ordinals to placeholders, left to right, starting at 1.
///
/// Re-running the pass renumbers from scratch, so it is idempotent over
/// queries that gained predicates since the last run.
pub fn number_placeholders(query: &mut Query) {
    let mut next = 1u32;
    for predicate in &mut query.predicates {
        if let Operand::Placeholder(ordinal) = &mut predicate.operand {
            *ordinal = Some(next);
            next += 1;
        }
    }
}

/// Inline a view source into a plain table query.
///
/// The view's predicates come first, then the caller's, preserving the
/// caller's placeholder order relative to its own predicates. Table
/// sources pass through unchanged.
pub fn resolve_view(query: Query, catalog: &ViewCatalog) -> QueryResult<Query> {
    match query.source {
        Source::Table(_) => Ok(query),
        Source::View(name) => {
            let view = catalog.resolve(&name)?;
            let mut predicates = view.predicates.clone();
            predicates.extend(query.predicates);
            Ok(Query {
                source: Source::Table(view.schema_key.clone()),
                predicates,
            })
        }
    }
}
