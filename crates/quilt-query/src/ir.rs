use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a query reads from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// An entity table, addressed by schema key.
    Table(String),
    /// A named view; inlined by the rewriter before planning.
    View(String),
}

/// A predicate operand: an inline value or a positional placeholder.
///
/// Placeholders start unnumbered; [`number_placeholders`] assigns ordinals
/// left to right before binding.
///
/// [`number_placeholders`]: crate::rewrite::number_placeholders
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Literal(Value),
    Placeholder(Option<u32>),
}

impl Operand {
    pub fn placeholder() -> Self {
        Operand::Placeholder(None)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Eq,
    Ne,
}

/// One conjunct. `column` is `entity_id`, `file_id`, or a top-level field
/// of the entity content; a missing content field compares as JSON null.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub op: Comparison,
    pub operand: Operand,
}

impl Predicate {
    pub fn eq(column: impl Into<String>, operand: Operand) -> Self {
        Self {
            column: column.into(),
            op: Comparison::Eq,
            operand,
        }
    }

    pub fn ne(column: impl Into<String>, operand: Operand) -> Self {
        Self {
            column: column.into(),
            op: Comparison::Ne,
            operand,
        }
    }
}

/// A query: a source and a conjunction of predicates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub source: Source,
    pub predicates: Vec<Predicate>,
}

impl Query {
    pub fn table(schema_key: impl Into<String>) -> Self {
        Self {
            source: Source::Table(schema_key.into()),
            predicates: Vec::new(),
        }
    }

    pub fn view(name: impl Into<String>) -> Self {
        Self {
            source: Source::View(name.into()),
            predicates: Vec::new(),
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }
}
