use crate::pagination::PaginationInfo;
use crate::types::{
    AggregationResult, BucketResult, BucketValue, Document, FacetCountMap, RawResult,
    SearchResponse,
};
use serde_json::Value;

/// Hit field holding the product id.
pub const ID_FIELD: &str = "objectID";
/// Container some engines nest stored fields under.
pub const NESTED_FIELDS: &str = "fields";

/// Id of a raw hit, from `objectID` or, failing that, `fields.objectID`.
/// Numeric ids are accepted and rendered as strings.
pub fn hit_id(hit: &Value) -> Option<String> {
    let direct = hit.get(ID_FIELD);
    let nested = hit.get(NESTED_FIELDS).and_then(|f| f.get(ID_FIELD));
    direct
        .and_then(id_string)
        .or_else(|| nested.and_then(id_string))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Documents and paging counters decoded from one engine result.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedResult {
    pub documents: Vec<Document>,
    pub total_count: u64,
    pub total_pages: u64,
    pub page_size: usize,
    pub current_page: usize,
}

pub struct DocumentMapper;

impl DocumentMapper {
    /// Engine-reported page count and page size win over values derived from
    /// the request. Hits without an id are dropped.
    pub fn process(result: &RawResult, pagination: &PaginationInfo) -> MappedResult {
        let page_size = result.hits_per_page.unwrap_or(pagination.page_size());
        let total_pages = result
            .nb_pages
            .unwrap_or_else(|| result.nb_hits.div_ceil(pagination.page_size() as u64));

        let documents: Vec<Document> = result
            .hits
            .iter()
            .filter_map(|hit| hit_id(hit).map(|id| Document { id }))
            .collect();
        if documents.len() < result.hits.len() {
            tracing::debug!(
                "[RESPONSE] dropped {} hits without {}",
                result.hits.len() - documents.len(),
                ID_FIELD
            );
        }

        MappedResult {
            documents,
            total_count: result.nb_hits,
            total_pages,
            page_size,
            current_page: pagination.page_number(),
        }
    }
}

/// Loosely shaped response bundle, as an engine bridge hands it over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub documents: Vec<Value>,
    pub facets: FacetCountMap,
    pub total: Option<u64>,
}

/// One bucket per facet, keyed by the raw facet value.
pub fn facet_buckets(facets: &FacetCountMap) -> AggregationResult {
    facets
        .iter()
        .map(|(name, counts)| {
            let buckets: BucketResult = counts
                .iter()
                .map(|(value, count)| (value.clone(), BucketValue::new(value.clone(), *count)))
                .collect();
            (name.clone(), buckets)
        })
        .collect()
}

pub struct ResponseFactory;

impl ResponseFactory {
    /// Paging counters are not part of a raw bundle: the whole result is one
    /// page starting at page 1.
    pub fn create(raw: RawResponse) -> SearchResponse {
        let documents: Vec<Document> = raw
            .documents
            .iter()
            .filter_map(|hit| hit_id(hit).map(|id| Document { id }))
            .collect();
        let total_count = raw.total.unwrap_or(0);
        let page_size = documents.len();
        SearchResponse {
            total_pages: if total_count > 0 && page_size > 0 {
                total_count.div_ceil(page_size as u64)
            } else {
                0
            },
            documents,
            aggregations: facet_buckets(&raw.facets),
            total_count,
            page_size,
            current_page: 1,
        }
    }

    pub fn from_mapped(mapped: MappedResult, aggregations: AggregationResult) -> SearchResponse {
        SearchResponse {
            documents: mapped.documents,
            aggregations,
            total_count: mapped.total_count,
            total_pages: mapped.total_pages,
            page_size: mapped.page_size,
            current_page: mapped.current_page,
        }
    }
}
