//! Live Klaviyo API client. JSON:API-flavored paginated collections with
//! `{ data: [...], meta: { total } }`, bearer-style key header, and a dated
//! `revision` header on every request.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use vinepulse_core::config::UpstreamConfig;
use vinepulse_core::types::CampaignSummary;
use vinepulse_core::{VinePulseError, VinePulseResult};

use crate::marketing::{CampaignEngagement, ListSummary, MarketingApi};

/// Campaigns endpoint is restricted to one channel per request.
const EMAIL_CHANNEL_FILTER: &str = "equals(messages.channel,\"email\")";

#[derive(Debug)]
pub struct KlaviyoClient {
    http: Client,
    base_url: String,
}

// ─── JSON:API response shapes ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiPage<A> {
    #[serde(default = "Vec::new")]
    data: Vec<Resource<A>>,
    #[serde(default)]
    meta: PageMeta,
}

#[derive(Debug, Default, Deserialize)]
struct PageMeta {
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Resource<A> {
    id: String,
    attributes: A,
}

#[derive(Debug, Deserialize)]
struct CampaignAttributes {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    send_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ListAttributes {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    profile_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProfileAttributes {}

#[derive(Debug, Deserialize)]
struct ReportDocument {
    data: ReportData,
}

#[derive(Debug, Deserialize)]
struct ReportData {
    attributes: ReportAttributes,
}

#[derive(Debug, Deserialize)]
struct ReportAttributes {
    #[serde(default = "Vec::new")]
    results: Vec<ReportResult>,
}

#[derive(Debug, Deserialize)]
struct ReportResult {
    #[serde(default)]
    statistics: ReportStatistics,
}

#[derive(Debug, Default, Deserialize)]
struct ReportStatistics {
    #[serde(default)]
    recipients: Option<u64>,
    #[serde(default)]
    opens: Option<u64>,
    #[serde(default)]
    clicks: Option<u64>,
    #[serde(default)]
    conversion_value: Option<f64>,
}

// ─── Client ─────────────────────────────────────────────────────────────────

impl KlaviyoClient {
    pub fn new(config: &UpstreamConfig) -> VinePulseResult<Self> {
        if config.api_key.is_empty() {
            return Err(VinePulseError::UpstreamConfig(
                "upstream API key is not set; configure VINEPULSE__UPSTREAM__API_KEY or switch to the demo data source".into(),
            ));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Klaviyo-API-Key {}", config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| VinePulseError::UpstreamConfig(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "revision",
            HeaderValue::from_str(&config.revision)
                .map_err(|e| VinePulseError::UpstreamConfig(e.to_string()))?,
        );

        let http = ClientBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| VinePulseError::Upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_page<A: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> VinePulseResult<ApiPage<A>> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "Klaviyo API request");

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| VinePulseError::Upstream(format!("GET {endpoint}: {e}")))?;

        Self::decode(endpoint, response).await
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> VinePulseResult<T> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(VinePulseError::UpstreamConfig(format!(
                "{endpoint} returned {status}; check the upstream API key"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VinePulseError::Upstream(format!(
                "{endpoint} returned {status}: {body}"
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| VinePulseError::Upstream(format!("{endpoint} decode: {e}")))
    }
}

#[async_trait]
impl MarketingApi for KlaviyoClient {
    async fn campaigns(&self, page_size: u32) -> VinePulseResult<Vec<CampaignSummary>> {
        let params = vec![
            ("page[size]".to_string(), page_size.to_string()),
            ("filter".to_string(), EMAIL_CHANNEL_FILTER.to_string()),
            (
                "fields[campaign]".to_string(),
                "name,status,created_at,updated_at,send_time,archived".to_string(),
            ),
        ];

        let page: ApiPage<CampaignAttributes> = self.get_page("/campaigns", &params).await?;

        let summaries = page
            .data
            .into_iter()
            .map(|resource| CampaignSummary {
                id: resource.id,
                name: resource
                    .attributes
                    .name
                    .unwrap_or_else(|| "Untitled Campaign".to_string()),
                status: resource.attributes.status.unwrap_or_else(|| "draft".to_string()),
                created_at: resource.attributes.created_at,
                sent_at: resource.attributes.send_time,
                recipient_count: 0,
                open_count: 0,
                click_count: 0,
                open_rate: 0.0,
                click_rate: 0.0,
                revenue: 0.0,
            })
            .collect();

        Ok(summaries)
    }

    async fn campaign_engagement(&self, campaign_id: &str) -> VinePulseResult<CampaignEngagement> {
        let body = serde_json::json!({
            "data": {
                "type": "campaign-values-report",
                "attributes": {
                    "statistics": ["recipients", "opens", "clicks", "conversion_value"],
                    "filter": format!("equals(campaign_id,\"{campaign_id}\")"),
                    "timeframe": { "key": "last_12_months" }
                }
            }
        });

        let url = format!("{}/campaign-values-reports", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| VinePulseError::Upstream(format!("POST /campaign-values-reports: {e}")))?;

        let report: ReportDocument = Self::decode("/campaign-values-reports", response).await?;
        let stats = report
            .data
            .attributes
            .results
            .into_iter()
            .next()
            .map(|r| r.statistics)
            .unwrap_or_default();

        Ok(CampaignEngagement {
            recipients: stats.recipients.unwrap_or(0),
            opens: stats.opens.unwrap_or(0),
            clicks: stats.clicks.unwrap_or(0),
            revenue: stats.conversion_value.unwrap_or(0.0),
        })
    }

    async fn profile_total(&self) -> VinePulseResult<u64> {
        // Page size 1 — only meta.total matters here.
        let params = vec![
            ("page[size]".to_string(), "1".to_string()),
            ("fields[profile]".to_string(), "email,created".to_string()),
        ];

        let page: ApiPage<ProfileAttributes> = self.get_page("/profiles", &params).await?;
        Ok(page.meta.total.unwrap_or(0))
    }

    async fn lists(&self) -> VinePulseResult<Vec<ListSummary>> {
        let params = vec![(
            "fields[list]".to_string(),
            "name,created,updated,profile_count".to_string(),
        )];

        let page: ApiPage<ListAttributes> = self.get_page("/lists", &params).await?;

        let lists = page
            .data
            .into_iter()
            .map(|resource| ListSummary {
                id: resource.id,
                name: resource.attributes.name.unwrap_or_default(),
                profile_count: resource.attributes.profile_count.unwrap_or(0),
            })
            .collect();

        Ok(lists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_decoding() {
        let raw = r#"{
            "data": [
                { "id": "abc", "attributes": { "name": "Fall Release", "status": "sent" } },
                { "id": "def", "attributes": {} }
            ],
            "meta": { "total": 2 }
        }"#;
        let page: ApiPage<CampaignAttributes> = serde_json::from_str(raw).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.meta.total, Some(2));
        assert_eq!(page.data[0].attributes.name.as_deref(), Some("Fall Release"));
        assert!(page.data[1].attributes.name.is_none());
    }

    #[test]
    fn test_missing_meta_total() {
        let raw = r#"{ "data": [], "meta": {} }"#;
        let page: ApiPage<ProfileAttributes> = serde_json::from_str(raw).unwrap();
        assert_eq!(page.meta.total, None);
    }

    #[test]
    fn test_empty_key_rejected() {
        let config = UpstreamConfig::default();
        let err = KlaviyoClient::new(&config).unwrap_err();
        assert!(matches!(err, VinePulseError::UpstreamConfig(_)));
    }
}
