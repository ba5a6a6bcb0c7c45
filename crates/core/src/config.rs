use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `VINEPULSE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub insight: InsightConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Optional dashboard API key. When set, requests must carry it in
    /// the `x-api-key` header.
    #[serde(default)]
    pub dashboard_key: Option<String>,
}

/// Marketing platform (Klaviyo-style) API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Klaviyo requires a dated `revision` header on every request.
    #[serde(default = "default_revision")]
    pub revision: String,
    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_campaign_page_size")]
    pub campaign_page_size: u32,
    #[serde(default = "default_data_source")]
    pub data_source: DataSource,
}

/// Which strategy backs the `MarketingApi` trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Real upstream API calls.
    Live,
    /// Fixed illustrative figures, no network.
    Demo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightConfig {
    #[serde(default = "default_insight_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_insight_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_insight_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
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
fn default_upstream_base_url() -> String {
    "https://a.klaviyo.com/api".to_string()
}
fn default_revision() -> String {
    "2024-10-15".to_string()
}
fn default_upstream_timeout_ms() -> u64 {
    30_000
}
fn default_campaign_page_size() -> u32 {
    100
}
fn default_data_source() -> DataSource {
    DataSource::Live
}
fn default_insight_base_url() -> String {
    "https://api.anthropic.com".to_string()
}
fn default_insight_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_insight_timeout_ms() -> u64 {
    60_000
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            dashboard_key: None,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            api_key: String::new(),
            revision: default_revision(),
            timeout_ms: default_upstream_timeout_ms(),
            campaign_page_size: default_campaign_page_size(),
            data_source: default_data_source(),
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            base_url: default_insight_base_url(),
            api_key: String::new(),
            model: default_insight_model(),
            max_tokens: default_max_tokens(),
            timeout_ms: default_insight_timeout_ms(),
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            upstream: UpstreamConfig::default(),
            insight: InsightConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("VINEPULSE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
