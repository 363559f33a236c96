pub mod builder;
pub mod filters;
pub mod params;

pub use builder::QueryParamBuilder;
pub use filters::FilterHandler;
pub use params::QueryParams;
