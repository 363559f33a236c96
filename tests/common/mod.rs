use catalog_bridge::resolvers::{
    StaticCategoryPathResolver, StaticLabelResolver, StaticPriceKeyResolver, StaticScopeResolver,
};
use catalog_bridge::{
    BridgeConfig, EngineExecutor, QueryParams, RawResult, Resolvers, Result, SearchAdapter,
};
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Engine stub that records every call and answers with a canned result.
pub struct CannedEngine {
    pub calls: Mutex<Vec<(String, QueryParams)>>,
    result: RawResult,
}

impl CannedEngine {
    pub fn new(result: RawResult) -> Arc<Self> {
        Arc::new(CannedEngine {
            calls: Mutex::new(Vec::new()),
            result,
        })
    }

    pub fn last_params(&self) -> QueryParams {
        self.calls.lock().unwrap().last().unwrap().1.clone()
    }
}

impl EngineExecutor for CannedEngine {
    fn execute(&self, index: &str, params: &QueryParams) -> Result<RawResult> {
        self.calls
            .lock()
            .unwrap()
            .push((index.to_string(), params.clone()));
        Ok(self.result.clone())
    }
}

pub fn storefront_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.facets.default = vec![
        "color".to_string(),
        "size".to_string(),
        "price".to_string(),
        "categories".to_string(),
    ];
    config
}

pub fn storefront_resolvers() -> Resolvers {
    Resolvers {
        scopes: Arc::new(
            StaticScopeResolver::new()
                .with_scope("default", 1)
                .with_scope("german", 2),
        ),
        price_keys: Arc::new(
            StaticPriceKeyResolver::new()
                .with_key(1, "USD.default")
                .with_key(2, "EUR.default"),
        ),
        labels: Arc::new(
            StaticLabelResolver::new()
                .with_option("color", "49", "Blue")
                .with_option("color", "50", "Red")
                .with_option("size", "167", "M")
                .with_option("size", "168", "L"),
        ),
        categories: Arc::new(
            StaticCategoryPathResolver::new()
                .with_path("11", "Men")
                .with_path("12", "Men /// Tops")
                .with_path("14", "Men /// Tops /// Jackets")
                .with_scoped_path(2, "11", "Herren"),
        ),
    }
}

pub fn adapter(engine: Arc<CannedEngine>) -> SearchAdapter {
    init_tracing();
    SearchAdapter::new(
        Arc::new(storefront_config()),
        storefront_resolvers(),
        engine,
    )
}
