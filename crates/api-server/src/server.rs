//! API server — HTTP router plus the Prometheus metrics listener.

use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use vinepulse_analytics::MetricsReducer;
use vinepulse_core::config::AppConfig;
use vinepulse_integrations::InsightClient;

pub struct ApiServer {
    config: AppConfig,
    reducer: Arc<MetricsReducer>,
    insight: Option<Arc<InsightClient>>,
}

impl ApiServer {
    pub fn new(
        config: AppConfig,
        reducer: Arc<MetricsReducer>,
        insight: Option<Arc<InsightClient>>,
    ) -> Self {
        Self {
            config,
            reducer,
            insight,
        }
    }

    /// Start the HTTP REST server. Blocks until shutdown.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            reducer: self.reducer.clone(),
            insight: self.insight.clone(),
            dashboard_key: self.config.api.dashboard_key.clone(),
            node_id: self.config.node_id.clone(),
            start_time: Instant::now(),
        };

        let app = Router::new()
            // Dashboard endpoints
            .route("/v1/metrics/dashboard", get(rest::dashboard_metrics))
            .route("/v1/metrics/history", get(rest::metric_history))
            .route("/v1/campaigns", get(rest::list_campaigns))
            .route("/v1/export/csv", get(rest::export_csv))
            .route("/v1/insights", post(rest::generate_insight))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
