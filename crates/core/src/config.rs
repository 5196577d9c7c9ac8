use serde::Deserialize;
use std::collections::BTreeMap;

/// Root application configuration. Loaded from an optional TOML file
/// overlaid with environment variables prefixed `AGENTADS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub relevance: RelevanceConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub clickhouse: ClickHouseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Serving policy for a single decision.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionConfig {
    /// Units returned when the request does not say.
    #[serde(default = "default_max_units")]
    pub default_max_units: u32,
    /// Upper bound on what a request may ask for.
    #[serde(default = "default_max_units_cap")]
    pub max_units_cap: u32,
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    #[serde(default = "default_disclosure_label")]
    pub disclosure_label: String,
}

/// Relevance awarded per number of leading taxonomy segments matched.
#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceConfig {
    #[serde(default = "default_vertical_score")]
    pub vertical: f64,
    #[serde(default = "default_category_score")]
    pub category: f64,
    #[serde(default = "default_subcategory_score")]
    pub subcategory: f64,
    #[serde(default = "default_intent_score")]
    pub intent: f64,
}

/// Versioned table of deprecated taxonomy strings and their replacements.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyConfig {
    #[serde(default = "default_taxonomy_version")]
    pub version: String,
    #[serde(default = "default_deprecated_taxonomies")]
    pub deprecated: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_tracking_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// JSON file with `campaigns` and `ad_units` loaded at startup.
    #[serde(default)]
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// `"disabled"` or `"openai"` (any OpenAI-compatible endpoint).
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_embedding_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClickHouseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_clickhouse_url")]
    pub url: String,
    #[serde(default = "default_clickhouse_db")]
    pub database: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_max_units() -> u32 {
    3
}
fn default_max_units_cap() -> u32 {
    10
}
fn default_ttl_ms() -> u64 {
    60_000
}
fn default_disclosure_label() -> String {
    "Sponsored".to_string()
}
fn default_vertical_score() -> f64 {
    0.5
}
fn default_category_score() -> f64 {
    0.7
}
fn default_subcategory_score() -> f64 {
    0.9
}
fn default_intent_score() -> f64 {
    1.0
}
fn default_taxonomy_version() -> String {
    "2".to_string()
}
fn default_deprecated_taxonomies() -> BTreeMap<String, String> {
    [(
        "shopping.ecommerce.platform",
        "business.ecommerce.platform.trial",
    )]
    .into_iter()
    .map(|(old, new)| (old.to_string(), new.to_string()))
    .collect()
}
fn default_tracking_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_embedding_provider() -> String {
    "disabled".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_embedding_endpoint() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}
fn default_embedding_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_embedding_timeout_ms() -> u64 {
    1500
}
fn default_min_similarity() -> f64 {
    0.3
}
fn default_max_results() -> usize {
    50
}
fn default_clickhouse_url() -> String {
    "http://localhost:8123".to_string()
}
fn default_clickhouse_db() -> String {
    "agentads".to_string()
}
fn default_batch_size() -> usize {
    1000
}
fn default_flush_interval_ms() -> u64 {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            default_max_units: default_max_units(),
            max_units_cap: default_max_units_cap(),
            ttl_ms: default_ttl_ms(),
            disclosure_label: default_disclosure_label(),
        }
    }
}

impl DecisionConfig {
    /// Units to return for a request, never more than `max_units_cap`.
    /// An explicit zero is honored and yields a no-fill.
    pub fn effective_max_units(&self, requested: Option<u32>) -> usize {
        requested
            .unwrap_or(self.default_max_units)
            .min(self.max_units_cap) as usize
    }
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            vertical: default_vertical_score(),
            category: default_category_score(),
            subcategory: default_subcategory_score(),
            intent: default_intent_score(),
        }
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            version: default_taxonomy_version(),
            deprecated: default_deprecated_taxonomies(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            base_url: default_tracking_base_url(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            endpoint: default_embedding_endpoint(),
            api_key_env: default_embedding_api_key_env(),
            timeout_ms: default_embedding_timeout_ms(),
            min_similarity: default_min_similarity(),
            max_results: default_max_results(),
        }
    }
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_clickhouse_url(),
            database: default_clickhouse_db(),
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            decision: DecisionConfig::default(),
            relevance: RelevanceConfig::default(),
            taxonomy: TaxonomyConfig::default(),
            tracking: TrackingConfig::default(),
            store: StoreConfig::default(),
            embedding: EmbeddingConfig::default(),
            clickhouse: ClickHouseConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("AGENTADS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
