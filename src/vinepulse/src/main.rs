//! VinePulse — winery email-marketing analytics dashboard backend.
//!
//! Main entry point that wires the upstream data source, metrics reducer,
//! insight client, and API server together.

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use vinepulse_analytics::MetricsReducer;
use vinepulse_api::ApiServer;
use vinepulse_core::config::{AppConfig, DataSource};
use vinepulse_integrations::marketing::MarketingApi;
use vinepulse_integrations::{DemoSource, InsightClient, KlaviyoClient};

#[derive(Parser, Debug)]
#[command(name = "vinepulse")]
#[command(about = "Winery email-marketing analytics dashboard backend")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "VINEPULSE__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "VINEPULSE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Serve fixed demo figures instead of calling the upstream API
    #[arg(long, default_value_t = false)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vinepulse=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("VinePulse starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if cli.demo {
        config.upstream.data_source = DataSource::Demo;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        data_source = ?config.upstream.data_source,
        "Configuration loaded"
    );

    // Select the upstream data source strategy
    let api: Arc<dyn MarketingApi> = match config.upstream.data_source {
        DataSource::Live => Arc::new(KlaviyoClient::new(&config.upstream)?),
        DataSource::Demo => Arc::new(DemoSource::new()),
    };

    let reducer = Arc::new(MetricsReducer::new(
        api,
        config.upstream.campaign_page_size,
    ));

    // Insight client is optional; endpoints return an error when absent
    let insight = if config.insight.api_key.is_empty() {
        warn!("Insight API key not set, /v1/insights disabled");
        None
    } else {
        Some(Arc::new(InsightClient::new(&config.insight)?))
    };

    let api_server = ApiServer::new(config, reducer, insight);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("VinePulse is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
