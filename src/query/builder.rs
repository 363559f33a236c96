use super::filters::{price_facet, FilterContext, FilterHandler, PRICE_FILTER};
use super::params::{
    QueryParams, FACETS, HITS_PER_PAGE, MAX_VALUES_PER_FACET, PAGE, QUERY, RULE_CONTEXTS,
};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::pagination::PaginationInfo;
use crate::resolvers::{OptionLabelResolver, PriceKeyResolver, ScopeResolver};
use crate::types::{FilterMap, ScopeId, SearchRequest};
use std::sync::Arc;

/// Configured facet name that expands to the hierarchical level facets.
pub const CATEGORIES_FACET: &str = "categories";
/// Prefix of the hierarchical category facets, `categories.level0` and up.
pub const CATEGORY_LEVEL_PREFIX: &str = "categories.level";

/// Compiles a storefront search request into engine query parameters.
///
/// Building never fails: a scope or price key that cannot be resolved costs
/// the request its facet list or some filters, not the search.
#[derive(Clone)]
pub struct QueryParamBuilder {
    config: Arc<BridgeConfig>,
    scopes: Arc<dyn ScopeResolver>,
    price_keys: Arc<dyn PriceKeyResolver>,
    labels: Arc<dyn OptionLabelResolver>,
}

impl QueryParamBuilder {
    pub fn new(
        config: Arc<BridgeConfig>,
        scopes: Arc<dyn ScopeResolver>,
        price_keys: Arc<dyn PriceKeyResolver>,
        labels: Arc<dyn OptionLabelResolver>,
    ) -> Self {
        QueryParamBuilder {
            config,
            scopes,
            price_keys,
            labels,
        }
    }

    pub fn build(&self, request: &SearchRequest, pagination: &PaginationInfo) -> QueryParams {
        self.build_with_remainder(request, pagination).0
    }

    /// Like [`build`](Self::build), also returning the filters no handler
    /// translated.
    pub fn build_with_remainder(
        &self,
        request: &SearchRequest,
        pagination: &PaginationInfo,
    ) -> (QueryParams, FilterMap) {
        self.build_in_scope(request, pagination, self.resolve_scope(request))
    }

    /// Compile against an already resolved scope.
    pub fn build_in_scope(
        &self,
        request: &SearchRequest,
        pagination: &PaginationInfo,
        scope: Option<ScopeId>,
    ) -> (QueryParams, FilterMap) {
        let mut params = QueryParams::new();
        params.set(HITS_PER_PAGE, pagination.page_size());
        params.set(PAGE, pagination.engine_page());
        params.set(FACETS, self.facet_list(scope));
        params.set(MAX_VALUES_PER_FACET, self.config.max_values_per_facet);
        params.append(RULE_CONTEXTS, self.config.rule_context_marker.clone());
        if let Some(text) = request.query_text() {
            params.set(QUERY, text);
        }

        let Some(mut filters) = request.conjunctive_filters() else {
            tracing::debug!(
                "[QUERY] request={} root is not a boolean query, skipping filters",
                request.name
            );
            return (params, FilterMap::new());
        };

        let ctx = FilterContext {
            config: &self.config,
            price_keys: self.price_keys.as_ref(),
            labels: self.labels.as_ref(),
        };
        for handler in FilterHandler::PIPELINE {
            if let Err(e) = handler.process(&ctx, &mut params, &mut filters, scope) {
                tracing::warn!(
                    "[QUERY] request={} {} filter stage failed, later stages skipped: {}",
                    request.name,
                    handler.name(),
                    e
                );
                break;
            }
        }

        if !filters.is_empty() {
            tracing::debug!(
                "[QUERY] request={} unhandled filters: {:?}",
                request.name,
                filters.keys().collect::<Vec<_>>()
            );
        }
        (params, filters)
    }

    /// Scope of the request's first dimension. Unresolvable scopes are logged
    /// and treated as absent.
    pub fn resolve_scope(&self, request: &SearchRequest) -> Option<ScopeId> {
        let dimension = request.dimensions.first()?;
        match self.scopes.resolve(dimension) {
            Ok(scope) => Some(scope),
            Err(e) => {
                tracing::warn!(
                    "[QUERY] request={} scope {}={} unresolved: {}",
                    request.name,
                    dimension.name,
                    dimension.value,
                    e
                );
                None
            }
        }
    }

    /// Configured facets for the scope, flattened to engine facet names, or
    /// an empty list when any of them cannot be resolved.
    pub fn facet_list(&self, scope: Option<ScopeId>) -> Vec<String> {
        match self.flatten_facets(scope) {
            Ok(facets) => facets,
            Err(e) => {
                tracing::warn!("[QUERY] facet list unavailable, sending none: {}", e);
                Vec::new()
            }
        }
    }

    fn flatten_facets(&self, scope: Option<ScopeId>) -> Result<Vec<String>> {
        let configured = self.config.facets.for_scope(scope);
        let mut facets = Vec::with_capacity(configured.len() + self.config.category_levels);
        for name in configured {
            match name.as_str() {
                PRICE_FILTER => {
                    let scope = scope.ok_or_else(|| {
                        BridgeError::ScopeNotFound("price facet needs a scope".to_string())
                    })?;
                    facets.push(price_facet(self.price_keys.as_ref(), scope)?);
                }
                CATEGORIES_FACET => {
                    facets.extend(
                        (0..self.config.category_levels)
                            .map(|level| format!("{}{}", CATEGORY_LEVEL_PREFIX, level)),
                    );
                }
                other => facets.push(other.to_string()),
            }
        }
        Ok(facets)
    }
}
