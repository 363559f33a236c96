use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const HITS_PER_PAGE: &str = "hitsPerPage";
pub const PAGE: &str = "page";
pub const QUERY: &str = "query";
pub const FACETS: &str = "facets";
pub const MAX_VALUES_PER_FACET: &str = "maxValuesPerFacet";
pub const FACET_FILTERS: &str = "facetFilters";
pub const NUMERIC_FILTERS: &str = "numericFilters";
pub const RULE_CONTEXTS: &str = "ruleContexts";

/// Engine query parameters for one search.
///
/// Key order is insertion order, and clauses appended to the same family
/// keep their order, so the serialized form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(Map<String, Value>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Append one clause to a clause family, creating it if needed. A scalar
    /// already stored under the key is kept as the family's first clause.
    pub fn append(&mut self, family: &str, clause: impl Into<String>) {
        let entry = self
            .0
            .entry(family.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            let existing = entry.take();
            *entry = Value::Array(vec![existing]);
        }
        if let Value::Array(items) = entry {
            items.push(Value::String(clause.into()));
        }
    }

    /// String clauses of a family, in append order.
    pub fn clauses(&self, family: &str) -> Vec<&str> {
        match self.0.get(family) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(s)) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.0.get(key)?.as_u64().map(|n| n as usize)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
