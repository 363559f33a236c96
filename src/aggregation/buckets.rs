use super::nice_scale::{self, NiceRange, DEFAULT_MAX_BUCKETS};
use crate::error::Result;
use crate::query::builder::CATEGORY_LEVEL_PREFIX;
use crate::resolvers::{non_empty, CategoryPathResolver, OptionLabelResolver};
use crate::types::{BucketResult, BucketValue, FacetCountMap, ScopeId};
use indexmap::IndexMap;

/// Prefix shared by every scope/currency qualified price facet.
pub const PRICE_FACET_PREFIX: &str = "price.";

/// Facet labels → option ids.
pub struct AttributeBucketBuilder<'a> {
    labels: &'a dyn OptionLabelResolver,
}

impl<'a> AttributeBucketBuilder<'a> {
    pub fn new(labels: &'a dyn OptionLabelResolver) -> Self {
        AttributeBucketBuilder { labels }
    }

    /// Labels without an option id are dropped, not zero-filled.
    pub fn build(&self, field: &str, counts: &IndexMap<String, u64>) -> BucketResult {
        let mut result = BucketResult::new();
        for (label, count) in counts {
            match non_empty(self.labels.option_id(field, label)) {
                Some(id) => {
                    result.insert(id.clone(), BucketValue::new(id, *count));
                }
                None => {
                    tracing::debug!("[BUCKET] {}: no option id for label {:?}", field, label);
                }
            }
        }
        result
    }
}

/// Hierarchical category facets → counts per candidate category id.
pub struct CategoryBucketBuilder<'a> {
    paths: &'a dyn CategoryPathResolver,
}

impl<'a> CategoryBucketBuilder<'a> {
    pub fn new(paths: &'a dyn CategoryPathResolver) -> Self {
        CategoryBucketBuilder { paths }
    }

    pub fn build(
        &self,
        candidate_ids: &[String],
        facets: &FacetCountMap,
        scope: Option<ScopeId>,
    ) -> BucketResult {
        if candidate_ids.is_empty() {
            return BucketResult::new();
        }
        let paths = self.paths.paths(candidate_ids, scope);
        let counts = flatten_category_counts(facets);

        let mut result = BucketResult::new();
        for id in candidate_ids {
            let Some(path) = paths.get(id) else {
                continue;
            };
            if let Some(count) = counts.get(path) {
                result.insert(id.clone(), BucketValue::new(id.clone(), *count));
            }
        }
        result
    }
}

/// Merge every `categories.levelN` sub-map into one `path -> count` map.
///
/// Paths are unique per category, so levels never collide; if the engine
/// does repeat a path the first count wins.
pub fn flatten_category_counts(facets: &FacetCountMap) -> IndexMap<String, u64> {
    let mut flat = IndexMap::new();
    for (name, counts) in facets {
        if !name.starts_with(CATEGORY_LEVEL_PREFIX) {
            continue;
        }
        for (path, count) in counts {
            if flat.contains_key(path) {
                tracing::debug!("[BUCKET] category path {:?} repeated in {}", path, name);
                continue;
            }
            flat.insert(path.clone(), *count);
        }
    }
    flat
}

/// Price points → nice-number histogram.
#[derive(Debug, Clone, Copy)]
pub struct PriceRangeBucketBuilder {
    max_buckets: usize,
}

impl Default for PriceRangeBucketBuilder {
    fn default() -> Self {
        PriceRangeBucketBuilder {
            max_buckets: DEFAULT_MAX_BUCKETS,
        }
    }
}

impl PriceRangeBucketBuilder {
    pub fn new(max_buckets: usize) -> Self {
        PriceRangeBucketBuilder { max_buckets }
    }

    /// Takes the whole facet map: the price facet name carries a scope and
    /// currency suffix the caller does not know up front.
    pub fn build(&self, facets: &FacetCountMap) -> Result<BucketResult> {
        let Some((name, counts)) = facets
            .iter()
            .find(|(name, _)| name.starts_with(PRICE_FACET_PREFIX))
        else {
            return Ok(BucketResult::new());
        };

        let prices: Vec<(f64, u64)> = counts
            .iter()
            .filter_map(|(raw, count)| match raw.trim().parse::<f64>() {
                Ok(price) if price.is_finite() => Some((price, *count)),
                _ => {
                    tracing::debug!("[BUCKET] {}: skipping non-numeric price {:?}", name, raw);
                    None
                }
            })
            .collect();

        let values: Vec<f64> = prices.iter().map(|(p, _)| *p).collect();
        let ranges = nice_scale::buckets(&values, self.max_buckets)?;
        Ok(count_in_ranges(&prices, &ranges))
    }
}

/// Sum price-point counts per range. Ranges are `[min, max)` except the last,
/// which also takes everything below `max + 1` so the top price is never
/// dropped. Empty ranges are left out.
///
/// Keys print bounds with as many decimals as the step needs, so adjacent
/// ranges never share a key.
pub fn count_in_ranges(prices: &[(f64, u64)], ranges: &[NiceRange]) -> BucketResult {
    let mut result = BucketResult::new();
    let decimals = bound_decimals(ranges);
    let last = ranges.len().saturating_sub(1);
    for (i, range) in ranges.iter().enumerate() {
        let upper = if i == last { range.max + 1.0 } else { range.max };
        let count: u64 = prices
            .iter()
            .filter(|(price, _)| *price >= range.min && *price < upper)
            .map(|(_, count)| *count)
            .sum();
        if count == 0 {
            continue;
        }
        let key = format!(
            "{}_{}",
            format_bound(range.min, decimals),
            format_bound(range.max, decimals)
        );
        result.insert(
            key.clone(),
            BucketValue::range(key, count, range.min, range.max),
        );
    }
    result
}

/// Decimal places needed to tell consecutive bounds apart: one per power of
/// ten the step sits below 1.
fn bound_decimals(ranges: &[NiceRange]) -> usize {
    const DEFAULT_DECIMALS: usize = 2;
    const MAX_DECIMALS: usize = 12;
    let Some(step) = ranges.first().map(|r| r.max - r.min) else {
        return DEFAULT_DECIMALS;
    };
    if !step.is_finite() || step <= 0.0 {
        return DEFAULT_DECIMALS;
    }
    let exponent = step.log10().floor();
    if exponent >= 0.0 {
        0
    } else {
        (-exponent as usize).min(MAX_DECIMALS)
    }
}

fn format_bound(value: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, value);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
