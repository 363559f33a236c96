use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Store/website identifier partitioning configuration and catalog data.
pub type ScopeId = u32;

/// Filter key → filter node. Handlers remove the entries they translate, so
/// whatever is left after the pipeline is the unhandled remainder.
pub type FilterMap = IndexMap<String, FilterNode>;

/// Facet name → raw facet value → hit count, as returned by the engine.
pub type FacetCountMap = IndexMap<String, IndexMap<String, u64>>;

/// Bucket value identifier → value, for one requested aggregation.
pub type BucketResult = IndexMap<String, BucketValue>;

/// Aggregation name → bucket result.
pub type AggregationResult = IndexMap<String, BucketResult>;

/// Single field/value equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermFilter {
    pub field: String,
    pub value: String,
}

/// Numeric range over one field. Missing bounds are open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeFilter {
    pub field: String,
    #[serde(default)]
    pub from: Option<f64>,
    #[serde(default)]
    pub to: Option<f64>,
    #[serde(default = "default_true")]
    pub from_inclusive: bool,
    #[serde(default = "default_true")]
    pub to_inclusive: bool,
}

fn default_true() -> bool {
    true
}

impl RangeFilter {
    /// Range with both bounds inclusive.
    pub fn new(field: impl Into<String>, from: Option<f64>, to: Option<f64>) -> Self {
        RangeFilter {
            field: field.into(),
            from,
            to,
            from_inclusive: true,
            to_inclusive: true,
        }
    }
}

/// Field matching any of a set of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiValueFilter {
    pub field: String,
    pub values: Vec<String>,
}

/// An already-parsed filter node from the storefront's boolean query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterNode {
    Term(TermFilter),
    Range(RangeFilter),
    MultiValue(MultiValueFilter),
}

impl FilterNode {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        FilterNode::Term(TermFilter {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn range(field: impl Into<String>, from: Option<f64>, to: Option<f64>) -> Self {
        FilterNode::Range(RangeFilter::new(field, from, to))
    }

    pub fn multi_value<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterNode::MultiValue(MultiValueFilter {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn as_range(&self) -> Option<&RangeFilter> {
        match self {
            FilterNode::Range(r) => Some(r),
            _ => None,
        }
    }
}

/// Free-text match clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchQuery {
    pub field: String,
    pub text: String,
}

/// Boolean query. Clause maps are keyed by the storefront's clause name
/// (`category`, `price`, `visibility`, attribute codes, `search`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoolQuery {
    #[serde(default)]
    pub must: IndexMap<String, QueryNode>,
    #[serde(default)]
    pub should: IndexMap<String, QueryNode>,
    #[serde(default)]
    pub must_not: IndexMap<String, QueryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QueryNode {
    Bool(BoolQuery),
    Match(MatchQuery),
    Filter { filter: FilterNode },
}

impl QueryNode {
    pub fn filter(node: FilterNode) -> Self {
        QueryNode::Filter { filter: node }
    }
}

/// Request dimension, e.g. `scope = "default"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BucketKind {
    Term,
    Dynamic,
    Range,
}

/// One requested aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketDefinition {
    pub name: String,
    pub field: String,
    pub kind: BucketKind,
    /// Explicit candidate values (category ids for the category bucket).
    #[serde(default)]
    pub include: Vec<String>,
}

/// Generic storefront search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub name: String,
    pub index: String,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    pub query: QueryNode,
    #[serde(default)]
    pub aggregations: Vec<BucketDefinition>,
    #[serde(default)]
    pub from: usize,
    #[serde(default = "default_size")]
    pub size: usize,
}

fn default_size() -> usize {
    20
}

impl SearchRequest {
    /// Top-level conjunctive filters, or `None` when the root is not a
    /// boolean query.
    pub fn conjunctive_filters(&self) -> Option<FilterMap> {
        match &self.query {
            QueryNode::Bool(b) => Some(
                b.must
                    .iter()
                    .filter_map(|(name, node)| match node {
                        QueryNode::Filter { filter } => Some((name.clone(), filter.clone())),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Free text of the first match clause under a boolean root.
    pub fn query_text(&self) -> Option<&str> {
        let QueryNode::Bool(b) = &self.query else {
            return None;
        };
        b.should
            .values()
            .chain(b.must.values())
            .find_map(|node| match node {
                QueryNode::Match(m) => Some(m.text.as_str()),
                _ => None,
            })
    }
}

/// One value of a bucket. `from`/`to` are set for price ranges only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketValue {
    pub value: String,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
}

impl BucketValue {
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        BucketValue {
            value: value.into(),
            count,
            from: None,
            to: None,
        }
    }

    pub fn range(value: impl Into<String>, count: u64, from: f64, to: f64) -> Self {
        BucketValue {
            value: value.into(),
            count,
            from: Some(from),
            to: Some(to),
        }
    }
}

/// A decompiled hit. Relevance score is not carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
}

/// Raw engine result, in Algolia response field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResult {
    #[serde(default)]
    pub hits: Vec<serde_json::Value>,
    #[serde(default)]
    pub nb_hits: u64,
    #[serde(default)]
    pub nb_pages: Option<u64>,
    #[serde(default)]
    pub hits_per_page: Option<usize>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub facets: FacetCountMap,
}

/// Generic search response handed back to the storefront.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub documents: Vec<Document>,
    pub aggregations: AggregationResult,
    pub total_count: u64,
    pub total_pages: u64,
    pub page_size: usize,
    pub current_page: usize,
}
