//! Interfaces to the storefront services this crate leans on, plus simple
//! in-memory implementations for embedding and tests.
//!
//! Lookup misses are `None`; an empty string from a backing store is treated
//! the same way by every caller.

use crate::error::{BridgeError, Result};
use crate::types::{Dimension, ScopeId};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Request dimension → scope id.
pub trait ScopeResolver: Send + Sync {
    fn resolve(&self, dimension: &Dimension) -> Result<ScopeId>;
}

/// Scope id → currency/customer-group qualified price key suffix, e.g.
/// `USD.default`. The facet name is `price.<suffix>`.
pub trait PriceKeyResolver: Send + Sync {
    fn price_key(&self, scope: ScopeId) -> Result<String>;
}

/// Attribute option id ⇄ display label.
pub trait OptionLabelResolver: Send + Sync {
    fn label(&self, field: &str, option_id: &str) -> Option<String>;
    fn option_id(&self, field: &str, label: &str) -> Option<String>;
}

/// Category id → full delimited path, e.g. `Men /// Tops /// Jackets`.
pub trait CategoryPathResolver: Send + Sync {
    fn paths(&self, ids: &[String], scope: Option<ScopeId>) -> IndexMap<String, String>;
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct StaticScopeResolver {
    scopes: HashMap<String, ScopeId>,
}

impl StaticScopeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, code: impl Into<String>, id: ScopeId) -> Self {
        self.scopes.insert(code.into(), id);
        self
    }
}

impl ScopeResolver for StaticScopeResolver {
    fn resolve(&self, dimension: &Dimension) -> Result<ScopeId> {
        if let Some(id) = self.scopes.get(&dimension.value) {
            return Ok(*id);
        }
        // Numeric dimension values are already ids.
        dimension
            .value
            .parse()
            .map_err(|_| BridgeError::ScopeNotFound(dimension.value.clone()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticPriceKeyResolver {
    keys: HashMap<ScopeId, String>,
}

impl StaticPriceKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, scope: ScopeId, suffix: impl Into<String>) -> Self {
        self.keys.insert(scope, suffix.into());
        self
    }
}

impl PriceKeyResolver for StaticPriceKeyResolver {
    fn price_key(&self, scope: ScopeId) -> Result<String> {
        self.keys
            .get(&scope)
            .cloned()
            .ok_or(BridgeError::PriceKeyUnavailable(scope))
    }
}

/// Per-field option tables.
#[derive(Debug, Clone, Default)]
pub struct StaticLabelResolver {
    options: HashMap<String, Vec<(String, String)>>,
}

impl StaticLabelResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(
        mut self,
        field: impl Into<String>,
        option_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        self.options
            .entry(field.into())
            .or_default()
            .push((option_id.into(), label.into()));
        self
    }
}

impl OptionLabelResolver for StaticLabelResolver {
    fn label(&self, field: &str, option_id: &str) -> Option<String> {
        let found = self
            .options
            .get(field)?
            .iter()
            .find(|(id, _)| id == option_id)
            .map(|(_, label)| label.clone());
        non_empty(found)
    }

    fn option_id(&self, field: &str, label: &str) -> Option<String> {
        let found = self
            .options
            .get(field)?
            .iter()
            .find(|(_, l)| l == label)
            .map(|(id, _)| id.clone());
        non_empty(found)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticCategoryPathResolver {
    paths: HashMap<String, String>,
    scoped: HashMap<(ScopeId, String), String>,
}

impl StaticCategoryPathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, id: impl Into<String>, path: impl Into<String>) -> Self {
        self.paths.insert(id.into(), path.into());
        self
    }

    /// Path that only applies in one scope (category names are store-view
    /// specific).
    pub fn with_scoped_path(
        mut self,
        scope: ScopeId,
        id: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.scoped.insert((scope, id.into()), path.into());
        self
    }
}

impl CategoryPathResolver for StaticCategoryPathResolver {
    fn paths(&self, ids: &[String], scope: Option<ScopeId>) -> IndexMap<String, String> {
        ids.iter()
            .filter_map(|id| {
                let scoped = scope.and_then(|s| self.scoped.get(&(s, id.clone())));
                let path = scoped.or_else(|| self.paths.get(id))?;
                if path.is_empty() {
                    return None;
                }
                Some((id.clone(), path.clone()))
            })
            .collect()
    }
}
