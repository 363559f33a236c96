//! Bridge between a storefront's generic faceted search requests and an
//! Algolia-compatible search engine.
//!
//! Requests are compiled into engine query parameters by
//! [`QueryParamBuilder`]; engine results are decompiled into documents and
//! aggregation buckets by [`DocumentMapper`] and [`AggregationBuilder`].
//! [`SearchAdapter`] runs the whole round trip against an [`EngineExecutor`].

pub mod adapter;
pub mod aggregation;
pub mod config;
pub mod error;
pub mod pagination;
pub mod price_cache;
pub mod query;
pub mod resolvers;
pub mod response;
pub mod types;

pub use adapter::{EngineExecutor, Resolvers, SearchAdapter};
pub use aggregation::AggregationBuilder;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use pagination::PaginationInfo;
pub use price_cache::{MaxPriceCache, MaxPriceSource};
pub use query::{QueryParamBuilder, QueryParams};
pub use response::{DocumentMapper, ResponseFactory};
pub use types::*;
