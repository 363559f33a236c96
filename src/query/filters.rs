use super::params::{QueryParams, FACET_FILTERS, NUMERIC_FILTERS, RULE_CONTEXTS};
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::resolvers::{non_empty, OptionLabelResolver, PriceKeyResolver};
use crate::types::{FilterMap, FilterNode, RangeFilter, ScopeId};

pub const CATEGORY_FILTER: &str = "category";
pub const PRICE_FILTER: &str = "price";
pub const VISIBILITY_FILTER: &str = "visibility";

/// Facet attribute the engine records carry category ids under.
pub const CATEGORY_IDS_FACET: &str = "categoryIds";
pub const CATEGORY_RULE_CONTEXT_PREFIX: &str = "magento-category-";

/// Collaborators shared by every handler for one request.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    pub config: &'a BridgeConfig,
    pub price_keys: &'a dyn PriceKeyResolver,
    pub labels: &'a dyn OptionLabelResolver,
}

/// Scope-qualified price facet name, e.g. `price.USD.default`.
pub fn price_facet(price_keys: &dyn PriceKeyResolver, scope: ScopeId) -> Result<String> {
    let suffix = price_keys.price_key(scope)?;
    Ok(format!("{}.{}", PRICE_FILTER, suffix.trim_start_matches('.')))
}

/// One stage of the filter pipeline.
///
/// Each stage removes the filters it translates from the map and appends the
/// matching clauses to the params. Recognized keys with an unexpected node
/// shape are left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterHandler {
    Category,
    PriceRange,
    Visibility,
    Attribute,
}

impl FilterHandler {
    /// Stages in the order they must run. Attribute goes last because it
    /// consumes whatever configured facet terms are still left.
    pub const PIPELINE: [FilterHandler; 4] = [
        FilterHandler::Category,
        FilterHandler::PriceRange,
        FilterHandler::Visibility,
        FilterHandler::Attribute,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterHandler::Category => "category",
            FilterHandler::PriceRange => "price_range",
            FilterHandler::Visibility => "visibility",
            FilterHandler::Attribute => "attribute",
        }
    }

    pub fn process(
        self,
        ctx: &FilterContext<'_>,
        params: &mut QueryParams,
        filters: &mut FilterMap,
        scope: Option<ScopeId>,
    ) -> Result<()> {
        match self {
            FilterHandler::Category => {
                process_category(params, filters);
                Ok(())
            }
            FilterHandler::PriceRange => process_price_range(ctx, params, filters, scope),
            FilterHandler::Visibility => {
                process_visibility(ctx.config, params, filters);
                Ok(())
            }
            FilterHandler::Attribute => {
                process_attributes(ctx, params, filters, scope);
                Ok(())
            }
        }
    }
}

fn process_category(params: &mut QueryParams, filters: &mut FilterMap) {
    let Some(FilterNode::Term(term)) = filters.get(CATEGORY_FILTER) else {
        return;
    };
    let id = term.value.clone();
    filters.shift_remove(CATEGORY_FILTER);

    params.append(FACET_FILTERS, format!("{}:{}", CATEGORY_IDS_FACET, id));
    params.append(
        RULE_CONTEXTS,
        format!("{}{}", CATEGORY_RULE_CONTEXT_PREFIX, id),
    );
    tracing::debug!("[FILTER] category={}", id);
}

fn process_price_range(
    ctx: &FilterContext<'_>,
    params: &mut QueryParams,
    filters: &mut FilterMap,
    scope: Option<ScopeId>,
) -> Result<()> {
    let Some(FilterNode::Range(range)) = filters.get(PRICE_FILTER) else {
        return Ok(());
    };
    let Some(scope) = scope else {
        tracing::debug!("[FILTER] price filter left unhandled: no scope");
        return Ok(());
    };
    let facet = price_facet(ctx.price_keys, scope)?;

    let clauses = price_clauses(&facet, range);
    filters.shift_remove(PRICE_FILTER);
    for clause in clauses {
        tracing::debug!("[FILTER] {}", clause);
        params.append(NUMERIC_FILTERS, clause);
    }
    Ok(())
}

fn price_clauses(facet: &str, range: &RangeFilter) -> Vec<String> {
    let mut clauses = Vec::with_capacity(2);
    if let Some(from) = range.from {
        let op = if range.from_inclusive { ">=" } else { ">" };
        clauses.push(format!("{}{}{:.3}", facet, op, from));
    }
    if let Some(to) = range.to {
        let op = if range.to_inclusive { "<=" } else { "<" };
        clauses.push(format!("{}{}{:.3}", facet, op, to));
    }
    clauses
}

fn process_visibility(config: &BridgeConfig, params: &mut QueryParams, filters: &mut FilterMap) {
    let values: Vec<String> = match filters.get(VISIBILITY_FILTER) {
        Some(FilterNode::Term(t)) => vec![t.value.clone()],
        Some(FilterNode::MultiValue(m)) => m.values.clone(),
        _ => return,
    };
    filters.shift_remove(VISIBILITY_FILTER);

    let mapping = &config.visibility;
    let mut wants_search = false;
    let mut wants_catalog = false;
    for value in &values {
        if *value == mapping.search_code {
            wants_search = true;
        } else if *value == mapping.catalog_code {
            wants_catalog = true;
        } else if *value == mapping.both_code {
            // matches every record
            tracing::debug!("[FILTER] visibility={} matches everything, no clause", value);
        } else {
            tracing::debug!("[FILTER] unknown visibility code {:?} ignored", value);
        }
    }

    if wants_search {
        params.append(NUMERIC_FILTERS, format!("{}=1", mapping.search_field));
    }
    if wants_catalog {
        params.append(NUMERIC_FILTERS, format!("{}=1", mapping.catalog_field));
    }
    tracing::debug!(
        "[FILTER] visibility={:?} search={} catalog={}",
        values,
        wants_search,
        wants_catalog
    );
}

fn process_attributes(
    ctx: &FilterContext<'_>,
    params: &mut QueryParams,
    filters: &mut FilterMap,
    scope: Option<ScopeId>,
) {
    let facets = &ctx.config.facets;
    filters.retain(|key, node| {
        let FilterNode::Term(term) = node else {
            return true;
        };
        if !facets.is_configured(scope, &term.field) {
            return true;
        }
        match non_empty(ctx.labels.label(&term.field, &term.value)) {
            Some(label) => {
                params.append(FACET_FILTERS, format!("{}:{}", term.field, label));
                tracing::debug!("[FILTER] {}: {}={} ({})", key, term.field, label, term.value);
                false
            }
            None => {
                tracing::debug!(
                    "[FILTER] {}: no label for {}={}, left unhandled",
                    key,
                    term.field,
                    term.value
                );
                true
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::resolvers::{StaticLabelResolver, StaticPriceKeyResolver};

    struct Fixture {
        config: BridgeConfig,
        prices: StaticPriceKeyResolver,
        labels: StaticLabelResolver,
    }

    impl Fixture {
        fn new(facets: &[&str]) -> Self {
            let mut config = BridgeConfig::default();
            config.facets.default = facets.iter().map(|s| s.to_string()).collect();
            Fixture {
                config,
                prices: StaticPriceKeyResolver::new().with_key(1, "USD.default"),
                labels: StaticLabelResolver::new()
                    .with_option("color", "123", "Blue")
                    .with_option("color", "124", "Red")
                    .with_option("size", "7", "XL"),
            }
        }

        fn ctx(&self) -> FilterContext<'_> {
            FilterContext {
                config: &self.config,
                price_keys: &self.prices,
                labels: &self.labels,
            }
        }

        fn run(
            &self,
            handler: FilterHandler,
            filters: &mut FilterMap,
            scope: Option<ScopeId>,
        ) -> Result<QueryParams> {
            let mut params = QueryParams::new();
            handler.process(&self.ctx(), &mut params, filters, scope)?;
            Ok(params)
        }
    }

    fn filters(entries: Vec<(&str, FilterNode)>) -> FilterMap {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    // ── category ────────────────────────────────────────────────────────

    #[test]
    fn category_term_consumed() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![("category", FilterNode::term("category_ids", "12"))]);
        let p = fx.run(FilterHandler::Category, &mut f, Some(1)).unwrap();
        assert!(f.is_empty());
        assert_eq!(p.clauses(FACET_FILTERS), vec!["categoryIds:12"]);
        assert_eq!(p.clauses(RULE_CONTEXTS), vec!["magento-category-12"]);
    }

    #[test]
    fn category_absent_is_noop() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![("color", FilterNode::term("color", "123"))]);
        let p = fx.run(FilterHandler::Category, &mut f, Some(1)).unwrap();
        assert_eq!(f.len(), 1);
        assert!(p.keys().next().is_none());
    }

    #[test]
    fn category_range_is_not_matched() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![(
            "category",
            FilterNode::range("category_ids", Some(1.0), Some(5.0)),
        )]);
        let p = fx.run(FilterHandler::Category, &mut f, Some(1)).unwrap();
        assert!(f.contains_key("category"));
        assert!(p.clauses(FACET_FILTERS).is_empty());
    }

    // ── price ───────────────────────────────────────────────────────────

    #[test]
    fn price_range_three_decimals() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![(
            "price",
            FilterNode::range("price", Some(20.0), Some(49.5)),
        )]);
        let p = fx.run(FilterHandler::PriceRange, &mut f, Some(1)).unwrap();
        assert!(f.is_empty());
        assert_eq!(
            p.clauses(NUMERIC_FILTERS),
            vec!["price.USD.default>=20.000", "price.USD.default<=49.500"]
        );
    }

    #[test]
    fn price_open_upper_bound() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![("price", FilterNode::range("price", Some(100.0), None))]);
        let p = fx.run(FilterHandler::PriceRange, &mut f, Some(1)).unwrap();
        assert_eq!(p.clauses(NUMERIC_FILTERS), vec!["price.USD.default>=100.000"]);
    }

    #[test]
    fn price_exclusive_bounds() {
        let fx = Fixture::new(&[]);
        let mut range = RangeFilter::new("price", Some(0.0), Some(10.0));
        range.to_inclusive = false;
        let mut f = filters(vec![("price", FilterNode::Range(range))]);
        let p = fx.run(FilterHandler::PriceRange, &mut f, Some(1)).unwrap();
        assert_eq!(
            p.clauses(NUMERIC_FILTERS),
            vec!["price.USD.default>=0.000", "price.USD.default<10.000"]
        );
    }

    #[test]
    fn price_unbounded_range_consumed_without_clauses() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![("price", FilterNode::range("price", None, None))]);
        let p = fx.run(FilterHandler::PriceRange, &mut f, Some(1)).unwrap();
        assert!(f.is_empty());
        assert!(!p.contains(NUMERIC_FILTERS));
    }

    #[test]
    fn price_term_is_not_matched() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![("price", FilterNode::term("price", "10"))]);
        let p = fx.run(FilterHandler::PriceRange, &mut f, Some(1)).unwrap();
        assert_eq!(f.len(), 1);
        assert!(p.clauses(NUMERIC_FILTERS).is_empty());
    }

    #[test]
    fn price_without_scope_left_in_map() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![("price", FilterNode::range("price", Some(1.0), None))]);
        fx.run(FilterHandler::PriceRange, &mut f, None).unwrap();
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn price_resolver_failure_propagates_without_consuming() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![("price", FilterNode::range("price", Some(1.0), None))]);
        let err = fx.run(FilterHandler::PriceRange, &mut f, Some(9)).unwrap_err();
        assert_eq!(err, BridgeError::PriceKeyUnavailable(9));
        assert_eq!(f.len(), 1);
    }

    // ── visibility ──────────────────────────────────────────────────────

    #[test]
    fn visibility_search_only() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![("visibility", FilterNode::term("visibility", "3"))]);
        let p = fx.run(FilterHandler::Visibility, &mut f, Some(1)).unwrap();
        assert!(f.is_empty());
        assert_eq!(p.clauses(NUMERIC_FILTERS), vec!["visibility_search=1"]);
    }

    #[test]
    fn visibility_set_emits_each_code_once() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![(
            "visibility",
            FilterNode::multi_value("visibility", ["3", "2", "3"]),
        )]);
        let p = fx.run(FilterHandler::Visibility, &mut f, Some(1)).unwrap();
        assert_eq!(
            p.clauses(NUMERIC_FILTERS),
            vec!["visibility_search=1", "visibility_catalog=1"]
        );
    }

    #[test]
    fn visibility_both_emits_nothing() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![("visibility", FilterNode::term("visibility", "4"))]);
        let p = fx.run(FilterHandler::Visibility, &mut f, Some(1)).unwrap();
        assert!(f.is_empty());
        assert!(p.clauses(NUMERIC_FILTERS).is_empty());
    }

    #[test]
    fn visibility_both_code_follows_config() {
        let mut fx = Fixture::new(&[]);
        fx.config.visibility.both_code = "9".to_string();
        let mut f = filters(vec![(
            "visibility",
            FilterNode::multi_value("visibility", ["9", "2"]),
        )]);
        let p = fx.run(FilterHandler::Visibility, &mut f, Some(1)).unwrap();
        assert!(f.is_empty());
        assert_eq!(p.clauses(NUMERIC_FILTERS), vec!["visibility_catalog=1"]);
    }

    #[test]
    fn visibility_range_is_not_matched() {
        let fx = Fixture::new(&[]);
        let mut f = filters(vec![(
            "visibility",
            FilterNode::range("visibility", Some(2.0), Some(4.0)),
        )]);
        fx.run(FilterHandler::Visibility, &mut f, Some(1)).unwrap();
        assert_eq!(f.len(), 1);
    }

    // ── attributes ──────────────────────────────────────────────────────

    #[test]
    fn attribute_configured_term_becomes_label() {
        let fx = Fixture::new(&["color"]);
        let mut f = filters(vec![("color", FilterNode::term("color", "123"))]);
        let p = fx.run(FilterHandler::Attribute, &mut f, Some(1)).unwrap();
        assert!(f.is_empty());
        assert_eq!(p.clauses(FACET_FILTERS), vec!["color:Blue"]);
    }

    #[test]
    fn attribute_unconfigured_field_stays() {
        let fx = Fixture::new(&["color"]);
        let mut f = filters(vec![
            ("color", FilterNode::term("color", "123")),
            ("size", FilterNode::term("size", "7")),
        ]);
        let p = fx.run(FilterHandler::Attribute, &mut f, Some(1)).unwrap();
        assert_eq!(f.len(), 1);
        assert!(f.contains_key("size"));
        assert_eq!(p.clauses(FACET_FILTERS), vec!["color:Blue"]);
    }

    #[test]
    fn attribute_unknown_label_stays() {
        let fx = Fixture::new(&["color"]);
        let mut f = filters(vec![("color", FilterNode::term("color", "999"))]);
        let p = fx.run(FilterHandler::Attribute, &mut f, Some(1)).unwrap();
        assert_eq!(f.len(), 1);
        assert!(p.clauses(FACET_FILTERS).is_empty());
    }

    #[test]
    fn attribute_uses_scope_facets() {
        let mut fx = Fixture::new(&["color"]);
        fx.config.facets.scopes.insert(2, vec!["size".to_string()]);
        let mut f = filters(vec![
            ("color", FilterNode::term("color", "123")),
            ("size", FilterNode::term("size", "7")),
        ]);
        let p = fx.run(FilterHandler::Attribute, &mut f, Some(2)).unwrap();
        assert_eq!(p.clauses(FACET_FILTERS), vec!["size:XL"]);
        assert!(f.contains_key("color"));
    }

    // ── pipeline ────────────────────────────────────────────────────────

    #[test]
    fn pipeline_keys_are_disjoint() {
        // A configured "price" facet must not let the attribute stage steal
        // the price range, and a category term must not be read as an
        // attribute even when "category_ids" is a configured facet.
        let fx = Fixture::new(&["color", "price", "category_ids"]);
        let mut f = filters(vec![
            ("category", FilterNode::term("category_ids", "5")),
            ("price", FilterNode::range("price", Some(10.0), Some(20.0))),
            ("visibility", FilterNode::term("visibility", "3")),
            ("color", FilterNode::term("color", "124")),
        ]);
        let mut params = QueryParams::new();
        for handler in FilterHandler::PIPELINE {
            handler
                .process(&fx.ctx(), &mut params, &mut f, Some(1))
                .unwrap();
        }
        assert!(f.is_empty());
        assert_eq!(params.clauses(FACET_FILTERS), vec!["categoryIds:5", "color:Red"]);
        assert_eq!(
            params.clauses(NUMERIC_FILTERS),
            vec![
                "price.USD.default>=10.000",
                "price.USD.default<=20.000",
                "visibility_search=1"
            ]
        );
    }

    #[test]
    fn pipeline_order_is_fixed() {
        assert_eq!(
            FilterHandler::PIPELINE.map(FilterHandler::name),
            ["category", "price_range", "visibility", "attribute"]
        );
    }

    #[test]
    fn price_facet_tolerates_leading_dot() {
        let r = StaticPriceKeyResolver::new().with_key(1, ".EUR.group_2");
        assert_eq!(price_facet(&r, 1).unwrap(), "price.EUR.group_2");
    }
}
