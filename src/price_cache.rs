use crate::error::Result;
use crate::types::ScopeId;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Highest product price per scope, for sizing price sliders.
pub trait MaxPriceSource: Send + Sync {
    fn max_price(&self, scope: ScopeId) -> Result<f64>;
}

/// Time-based cache of per-scope maximum prices.
///
/// Load failures are not cached; the next call tries again.
pub struct MaxPriceCache {
    entries: DashMap<ScopeId, (Instant, f64)>,
    ttl: Duration,
}

impl MaxPriceCache {
    pub fn new(ttl: Duration) -> Self {
        MaxPriceCache {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn from_secs(ttl_secs: u64) -> Self {
        Self::new(Duration::from_secs(ttl_secs))
    }

    pub fn get_or_load<F>(&self, scope: ScopeId, load: F) -> Result<f64>
    where
        F: FnOnce(ScopeId) -> Result<f64>,
    {
        if let Some(cached) = self.entries.get(&scope) {
            let (timestamp, price) = *cached;
            if timestamp.elapsed() < self.ttl {
                tracing::debug!(
                    "[PRICE_CACHE] HIT scope={} ({}ms old)",
                    scope,
                    timestamp.elapsed().as_millis()
                );
                return Ok(price);
            }
            tracing::debug!("[PRICE_CACHE] STALE scope={}", scope);
        }

        let price = load(scope)?;
        self.entries.insert(scope, (Instant::now(), price));
        Ok(price)
    }

    pub fn invalidate(&self, scope: ScopeId) {
        self.entries.remove(&scope);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
