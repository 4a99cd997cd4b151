use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::ir::Predicate;

/// A stored, named query fragment over one entity table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDef {
    pub name: String,
    pub schema_key: String,
    pub predicates: Vec<Predicate>,
}

/// Named views, resolved case-insensitively.
///
/// Definitions keep their original casing; lookups go through a lowercase
/// index maintained alongside the definitions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ViewCatalog {
    views: BTreeMap<String, ViewDef>,
    by_lowercase: BTreeMap<String, String>,
}

impl ViewCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Define a view. Names are unique case-insensitively.
    pub fn define(&mut self, view: ViewDef) -> QueryResult<()> {
        let lower = view.name.to_lowercase();
        if self.by_lowercase.contains_key(&lower) {
            return Err(QueryError::ViewAlreadyDefined(view.name));
        }
        self.by_lowercase.insert(lower, view.name.clone());
        self.views.insert(view.name.clone(), view);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let lower = name.to_lowercase();
        match self.by_lowercase.remove(&lower) {
            Some(actual) => self.views.remove(&actual).is_some(),
            None => false,
        }
    }

    /// Case-insensitive lookup.
    pub fn resolve(&self, name: &str) -> QueryResult<&ViewDef> {
        self.by_lowercase
            .get(&name.to_lowercase())
            .and_then(|actual| self.views.get(actual))
            .ok_or_else(|| QueryError::UnknownView(name.to_string()))
    }

    /// View names in definition casing, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.views.keys().map(String::as_str).collect()
    }
}
