use crate::aggregation::nice_scale::{self, NiceAxis};
use crate::aggregation::AggregationBuilder;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::pagination::PaginationInfo;
use crate::price_cache::{MaxPriceCache, MaxPriceSource};
use crate::query::{QueryParamBuilder, QueryParams};
use crate::resolvers::{CategoryPathResolver, OptionLabelResolver, PriceKeyResolver, ScopeResolver};
use crate::response::{DocumentMapper, ResponseFactory};
use crate::types::{RawResult, ScopeId, SearchRequest, SearchResponse};
use std::sync::Arc;

/// Runs compiled query parameters against one index of the engine.
pub trait EngineExecutor: Send + Sync {
    fn execute(&self, index: &str, params: &QueryParams) -> Result<RawResult>;
}

/// Storefront lookups the adapter needs.
#[derive(Clone)]
pub struct Resolvers {
    pub scopes: Arc<dyn ScopeResolver>,
    pub price_keys: Arc<dyn PriceKeyResolver>,
    pub labels: Arc<dyn OptionLabelResolver>,
    pub categories: Arc<dyn CategoryPathResolver>,
}

/// One search round trip: compile, execute, decompile.
pub struct SearchAdapter {
    builder: QueryParamBuilder,
    aggregations: AggregationBuilder,
    executor: Arc<dyn EngineExecutor>,
    max_prices: Option<Arc<dyn MaxPriceSource>>,
    price_cache: MaxPriceCache,
}

impl SearchAdapter {
    pub fn new(
        config: Arc<BridgeConfig>,
        resolvers: Resolvers,
        executor: Arc<dyn EngineExecutor>,
    ) -> Self {
        let price_cache = MaxPriceCache::from_secs(config.price_cache_ttl_secs);
        SearchAdapter {
            builder: QueryParamBuilder::new(
                config,
                resolvers.scopes,
                resolvers.price_keys,
                resolvers.labels.clone(),
            ),
            aggregations: AggregationBuilder::new(resolvers.labels, resolvers.categories),
            executor,
            max_prices: None,
            price_cache,
        }
    }

    pub fn with_max_price_source(mut self, source: Arc<dyn MaxPriceSource>) -> Self {
        self.max_prices = Some(source);
        self
    }

    /// Only invalid paging input or a failed engine call is an error; scope,
    /// filter and bucket problems shrink the response instead.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let t0 = std::time::Instant::now();
        let pagination = PaginationInfo::from_request(request.from, request.size)?;
        let scope = self.builder.resolve_scope(request);
        let (params, _unhandled) = self.builder.build_in_scope(request, &pagination, scope);

        let raw = self
            .executor
            .execute(&request.index, &params)
            .inspect_err(|e| {
                tracing::error!(
                    "[SEARCH] request={} index={} engine call failed: {}",
                    request.name,
                    request.index,
                    e
                );
            })?;

        let mapped = DocumentMapper::process(&raw, &pagination);
        let aggregations = self.aggregations.build(request, &raw.facets, scope);

        tracing::debug!(
            "[SEARCH] request={} index={} page={} hits={} docs={} aggs={} ({}ms)",
            request.name,
            request.index,
            pagination.page_number(),
            mapped.total_count,
            mapped.documents.len(),
            aggregations.len(),
            t0.elapsed().as_millis()
        );
        Ok(ResponseFactory::from_mapped(mapped, aggregations))
    }

    /// Slider axis from 0 to the scope's highest price.
    pub fn price_axis(&self, scope: ScopeId, max_ticks: usize) -> Result<Option<NiceAxis>> {
        let source = self.max_prices.as_ref().ok_or_else(|| {
            BridgeError::Config("no max price source installed".to_string())
        })?;
        let max = self
            .price_cache
            .get_or_load(scope, |s| source.max_price(s))?;
        if max.is_nan() || max <= 0.0 {
            return Ok(None);
        }
        nice_scale::nice_range(0.0, max, max_ticks).map(Some)
    }
}
