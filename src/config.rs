use crate::error::Result;
use crate::types::ScopeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

fn default_max_values_per_facet() -> usize {
    100
}

fn default_rule_context_marker() -> String {
    "magento_filters".to_string()
}

fn default_category_levels() -> usize {
    10
}

fn default_price_cache_ttl_secs() -> u64 {
    3600
}

/// Visibility codes as the storefront stores them, and the record fields the
/// indexer writes for each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisibilityMapping {
    pub catalog_code: String,
    pub search_code: String,
    /// Never expanded. The indexer already folds it into both record fields.
    pub both_code: String,
    pub catalog_field: String,
    pub search_field: String,
}

impl Default for VisibilityMapping {
    fn default() -> Self {
        VisibilityMapping {
            catalog_code: "2".to_string(),
            search_code: "3".to_string(),
            both_code: "4".to_string(),
            catalog_field: "visibility_catalog".to_string(),
            search_field: "visibility_search".to_string(),
        }
    }
}

/// Facet names configured for the storefront, with optional per-scope
/// overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacetSettings {
    pub default: Vec<String>,
    pub scopes: HashMap<ScopeId, Vec<String>>,
}

impl FacetSettings {
    pub fn for_scope(&self, scope: Option<ScopeId>) -> &[String] {
        scope
            .and_then(|s| self.scopes.get(&s))
            .unwrap_or(&self.default)
    }

    pub fn is_configured(&self, scope: Option<ScopeId>, field: &str) -> bool {
        self.for_scope(scope).iter().any(|f| f == field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    #[serde(default = "default_max_values_per_facet")]
    pub max_values_per_facet: usize,

    #[serde(default = "default_rule_context_marker")]
    pub rule_context_marker: String,

    /// Number of `categories.levelN` facets a `categories` facet expands to.
    #[serde(default = "default_category_levels")]
    pub category_levels: usize,

    #[serde(default)]
    pub facets: FacetSettings,

    #[serde(default)]
    pub visibility: VisibilityMapping,

    #[serde(default = "default_price_cache_ttl_secs")]
    pub price_cache_ttl_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            max_values_per_facet: default_max_values_per_facet(),
            rule_context_marker: default_rule_context_marker(),
            category_levels: default_category_levels(),
            facets: FacetSettings::default(),
            visibility: VisibilityMapping::default(),
            price_cache_ttl_secs: default_price_cache_ttl_secs(),
        }
    }
}

impl BridgeConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load `{dir}/bridge.json` if present, otherwise defaults. Either way,
    /// `CATALOG_BRIDGE_*` environment variables are applied on top.
    pub fn load_or_default(dir: &Path) -> Self {
        let path = dir.join("bridge.json");
        let mut config = if path.exists() {
            match Self::load(&path) {
                Ok(config) => {
                    tracing::info!(
                        "Loaded bridge config: facets={}, scopes={}",
                        config.facets.default.len(),
                        config.facets.scopes.len()
                    );
                    config
                }
                Err(e) => {
                    tracing::error!("Failed to load bridge.json: {}, using defaults", e);
                    BridgeConfig::default()
                }
            }
        } else {
            BridgeConfig::default()
        };
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("CATALOG_BRIDGE_MAX_VALUES_PER_FACET") {
            match v.trim().parse() {
                Ok(n) => self.max_values_per_facet = n,
                Err(_) => tracing::warn!(
                    "Ignoring CATALOG_BRIDGE_MAX_VALUES_PER_FACET={:?}: not a number",
                    v
                ),
            }
        }

        if let Ok(v) = std::env::var("CATALOG_BRIDGE_RULE_CONTEXT") {
            if !v.trim().is_empty() {
                self.rule_context_marker = v.trim().to_string();
            }
        }

        // Comma-separated facet names, e.g. "color,price,categories".
        if let Ok(v) = std::env::var("CATALOG_BRIDGE_FACETS") {
            let facets: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !facets.is_empty() {
                self.facets.default = facets;
            }
        }
    }
}
