//! REST API handlers for dashboard metrics, metric history, CSV export,
//! and AI insights.
//!
//! Every JSON response uses the `{ success, data?, error?, details? }`
//! envelope; auth failures map to 401, validation failures to 400, and
//! everything else to 500 with details.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};
use vinepulse_analytics::series::generate_series;
use vinepulse_analytics::MetricsReducer;
use vinepulse_core::types::{AggregateMetrics, CampaignSummary, Period, TimeSeriesPoint};
use vinepulse_core::VinePulseError;
use vinepulse_integrations::insight::{ConversationContext, InsightRequest};
use vinepulse_integrations::InsightClient;
use vinepulse_reporting::{ExportKind, ReportAssembler};

/// Campaigns shown on the dashboard's recent list.
const RECENT_CAMPAIGN_LIMIT: usize = 10;

/// Upper bound on requested page sizes at the API boundary.
const MAX_PAGE_SIZE: u32 = 100;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub reducer: Arc<MetricsReducer>,
    pub insight: Option<Arc<InsightClient>>,
    pub dashboard_key: Option<String>,
    pub node_id: String,
    pub start_time: Instant,
}

// ─── Envelope ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        })
    }
}

/// An error mapped to a status code and the JSON error envelope.
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl ApiError {
    fn unauthorized() -> Self {
        metrics::counter!("api.auth_errors").increment(1);
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized".to_string(),
            details: None,
        }
    }

    fn validation(msg: impl Into<String>) -> Self {
        metrics::counter!("api.validation_errors").increment(1);
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "validation_failed".to_string(),
            details: Some(msg.into()),
        }
    }
}

impl From<VinePulseError> for ApiError {
    fn from(e: VinePulseError) -> Self {
        let (status, error) = match &e {
            VinePulseError::Auth(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            VinePulseError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            VinePulseError::UpstreamConfig(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "upstream_unconfigured")
            }
            VinePulseError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream_failed"),
            VinePulseError::Insight(_) => (StatusCode::INTERNAL_SERVER_ERROR, "insight_failed"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            metrics::counter!("api.errors").increment(1);
        }
        Self {
            status,
            error: error.to_string(),
            details: Some(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            success: false,
            data: None,
            error: Some(self.error),
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Check the dashboard API key when one is configured.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &state.dashboard_key else {
        return Ok(());
    };
    let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        warn!("Request rejected: missing or invalid dashboard API key");
        Err(ApiError::unauthorized())
    }
}

// ─── Dashboard metrics ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct DashboardPayload {
    #[serde(flatten)]
    pub metrics: AggregateMetrics,
    pub recent_campaigns: Vec<CampaignSummary>,
}

/// GET /v1/metrics/dashboard
pub async fn dashboard_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Envelope<DashboardPayload>>, ApiError> {
    authorize(&state, &headers)?;

    let metrics = state.reducer.fetch_winery_aggregate().await;
    let recent_campaigns = match state.reducer.fetch_campaign_summaries(MAX_PAGE_SIZE).await {
        Ok(mut campaigns) => {
            campaigns.truncate(RECENT_CAMPAIGN_LIMIT);
            campaigns
        }
        Err(e) => {
            warn!(error = %e, "Recent campaign fetch failed, returning empty list");
            Vec::new()
        }
    };

    Ok(Envelope::ok(DashboardPayload {
        metrics,
        recent_campaigns,
    }))
}

// ─── Metric history ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct HistoryParams {
    pub metric: Option<String>,
    pub period: Option<String>,
    #[serde(default)]
    pub comparison: bool,
}

#[derive(Serialize)]
pub struct HistoryPayload {
    pub metric: String,
    pub period: &'static str,
    pub include_comparison: bool,
    pub series: Vec<TimeSeriesPoint>,
}

/// GET /v1/metrics/history?metric=&period=&comparison=
pub async fn metric_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Envelope<HistoryPayload>>, ApiError> {
    authorize(&state, &headers)?;

    let metric = params
        .metric
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::validation("metric type is required"))?;

    let period = Period::parse_or_default(params.period.as_deref().unwrap_or("90d"));
    let series = generate_series(&metric, period, params.comparison);

    Ok(Envelope::ok(HistoryPayload {
        metric,
        period: period.as_str(),
        include_comparison: params.comparison,
        series,
    }))
}

// ─── Campaigns ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CampaignParams {
    pub page_size: Option<u32>,
}

/// GET /v1/campaigns?page_size=
pub async fn list_campaigns(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CampaignParams>,
) -> Result<Json<Envelope<Vec<CampaignSummary>>>, ApiError> {
    authorize(&state, &headers)?;

    let page_size = params.page_size.unwrap_or(MAX_PAGE_SIZE);
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ApiError::validation(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let campaigns = state.reducer.fetch_campaign_summaries(page_size).await?;
    Ok(Envelope::ok(campaigns))
}

// ─── CSV export ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ExportParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// GET /v1/export/csv?type=campaigns|subscribers|analytics
///
/// Returns the artifact with Content-Type/Content-Disposition headers
/// instead of the JSON envelope.
pub async fn export_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    let kind = ExportKind::parse(params.kind.as_deref().unwrap_or("campaigns"))
        .ok_or_else(|| ApiError::validation("invalid export type"))?;

    let body = match kind {
        ExportKind::Campaigns => {
            let campaigns = state.reducer.fetch_campaign_summaries(MAX_PAGE_SIZE).await?;
            ReportAssembler::campaigns_csv(&campaigns)
        }
        ExportKind::Subscribers => {
            let metrics = state.reducer.fetch_winery_aggregate().await;
            let mut rng = StdRng::from_entropy();
            ReportAssembler::subscribers_csv(&metrics, &mut rng)
        }
        ExportKind::Analytics => {
            let metrics = state.reducer.fetch_winery_aggregate().await;
            ReportAssembler::analytics_csv(&metrics)
        }
    };

    let disposition = format!("attachment; filename=\"{}\"", kind.filename());
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/csv".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

// ─── Insights ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct InsightParams {
    pub query: String,
    /// Caller-owned conversation history; echoed back updated so session
    /// state never lives on the server.
    #[serde(default)]
    pub history: ConversationContext,
}

#[derive(Serialize)]
pub struct InsightPayload {
    pub response: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub history: ConversationContext,
}

/// POST /v1/insights
pub async fn generate_insight(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<InsightParams>,
) -> Result<Json<Envelope<InsightPayload>>, ApiError> {
    authorize(&state, &headers)?;

    if params.query.trim().is_empty() {
        return Err(ApiError::validation("query is required"));
    }

    let Some(insight) = &state.insight else {
        return Err(VinePulseError::Insight(
            "insight service is not configured".into(),
        )
        .into());
    };

    let metrics = state.reducer.fetch_winery_aggregate().await;
    let campaigns = state
        .reducer
        .fetch_campaign_summaries(MAX_PAGE_SIZE)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Campaign context fetch failed, sending metrics only");
            Vec::new()
        });

    let request = InsightRequest {
        query: params.query,
        metrics: Some(metrics),
        campaigns,
    };

    let mut history = params.history;
    let response = insight
        .generate(&request, &mut history)
        .await
        .inspect_err(|e| error!(error = %e, "Insight generation failed"))?;

    Ok(Envelope::ok(InsightPayload {
        response: response.content,
        model: response.model,
        input_tokens: response.input_tokens,
        output_tokens: response.output_tokens,
        history,
    }))
}

// ─── Operational endpoints ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
