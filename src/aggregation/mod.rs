pub mod buckets;
pub mod nice_scale;

use crate::resolvers::{CategoryPathResolver, OptionLabelResolver};
use crate::types::{
    AggregationResult, BucketKind, BucketResult, FacetCountMap, ScopeId, SearchRequest,
};
use buckets::{AttributeBucketBuilder, CategoryBucketBuilder, PriceRangeBucketBuilder};
use std::sync::Arc;

/// Aggregation field backed by the hierarchical category facets.
pub const CATEGORY_FIELD: &str = "category_ids";
/// Aggregation field backed by the scope-qualified price facet.
pub const PRICE_FIELD: &str = "price";

/// Turns the engine's facet counts into one bucket result per requested
/// aggregation.
#[derive(Clone)]
pub struct AggregationBuilder {
    labels: Arc<dyn OptionLabelResolver>,
    categories: Arc<dyn CategoryPathResolver>,
    price: PriceRangeBucketBuilder,
}

impl AggregationBuilder {
    pub fn new(
        labels: Arc<dyn OptionLabelResolver>,
        categories: Arc<dyn CategoryPathResolver>,
    ) -> Self {
        AggregationBuilder {
            labels,
            categories,
            price: PriceRangeBucketBuilder::default(),
        }
    }

    pub fn with_price_buckets(mut self, max_buckets: usize) -> Self {
        self.price = PriceRangeBucketBuilder::new(max_buckets);
        self
    }

    /// Every requested aggregation name is present in the result, with an
    /// empty bucket when there is nothing to report for it.
    pub fn build(
        &self,
        request: &SearchRequest,
        facets: &FacetCountMap,
        scope: Option<ScopeId>,
    ) -> AggregationResult {
        let mut result = AggregationResult::new();
        for definition in &request.aggregations {
            let buckets = if definition.field == CATEGORY_FIELD
                && definition.kind == BucketKind::Term
            {
                CategoryBucketBuilder::new(self.categories.as_ref()).build(
                    &definition.include,
                    facets,
                    scope,
                )
            } else if definition.field == PRICE_FIELD {
                self.price.build(facets).unwrap_or_else(|e| {
                    tracing::warn!(
                        "[AGG] {}: price histogram unavailable: {}",
                        definition.name,
                        e
                    );
                    BucketResult::new()
                })
            } else if let Some(counts) = facets.get(&definition.field) {
                AttributeBucketBuilder::new(self.labels.as_ref()).build(&definition.field, counts)
            } else {
                BucketResult::new()
            };

            tracing::debug!(
                "[AGG] {} field={} values={}",
                definition.name,
                definition.field,
                buckets.len()
            );
            result.insert(definition.name.clone(), buckets);
        }
        result
    }
}
