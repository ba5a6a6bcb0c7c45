//! AI insight client — sends reduced metrics plus a natural-language query
//! to a hosted text-generation service and returns prose.
//!
//! Conversation history is a caller-owned value passed per request, never
//! process-wide state, so concurrent sessions cannot leak into each other.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vinepulse_core::config::InsightConfig;
use vinepulse_core::types::{AggregateMetrics, CampaignSummary};
use vinepulse_core::{VinePulseError, VinePulseResult};

/// Only the most recent turns are forwarded upstream.
const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// Per-session conversation history with last-N truncation on push.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    turns: Vec<ConversationTurn>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: TurnRole, content: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
        if self.turns.len() > HISTORY_WINDOW {
            let excess = self.turns.len() - HISTORY_WINDOW;
            self.turns.drain(..excess);
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// A query plus the structured context blob sent alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<AggregateMetrics>,
    #[serde(default)]
    pub campaigns: Vec<CampaignSummary>,
}

/// Prose response plus the metadata the external query log persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

// ─── Wire shapes (Anthropic-style messages endpoint) ────────────────────────

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default = "Vec::new")]
    content: Vec<WireContent>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Deserialize)]
struct WireContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

// ─── Client ─────────────────────────────────────────────────────────────────

pub struct InsightClient {
    http: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl InsightClient {
    pub fn new(config: &InsightConfig) -> VinePulseResult<Self> {
        if config.api_key.is_empty() {
            return Err(VinePulseError::Config(
                "insight API key is not set; configure VINEPULSE__INSIGHT__API_KEY".into(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&config.api_key)
                .map_err(|e| VinePulseError::Config(e.to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = ClientBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| VinePulseError::Insight(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Generate prose for the query, updating the caller's conversation
    /// context with both sides of the exchange on success.
    pub async fn generate(
        &self,
        request: &InsightRequest,
        context: &mut ConversationContext,
    ) -> VinePulseResult<InsightResponse> {
        let system = build_system_prompt(request)?;

        let mut messages: Vec<WireMessage<'_>> = context
            .turns()
            .iter()
            .map(|turn| WireMessage {
                role: match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Assistant => "assistant",
                },
                content: &turn.content,
            })
            .collect();
        messages.push(WireMessage {
            role: "user",
            content: &request.query,
        });

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system,
            "messages": messages,
        });

        let url = format!("{}/v1/messages", self.base_url);
        debug!(%url, model = %self.model, "Insight service request");

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| VinePulseError::Insight(format!("POST /v1/messages: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(VinePulseError::Insight(format!(
                "insight service rejected the API key ({status})"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VinePulseError::Insight(format!(
                "insight service returned {status}: {body}"
            )));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| VinePulseError::Insight(format!("response decode: {e}")))?;

        let content = wire
            .content
            .into_iter()
            .find(|c| c.kind == "text")
            .map(|c| c.text)
            .ok_or_else(|| {
                VinePulseError::Insight("unexpected response format from insight service".into())
            })?;

        context.push(TurnRole::User, request.query.clone());
        context.push(TurnRole::Assistant, content.clone());

        Ok(InsightResponse {
            content,
            model: wire.model,
            input_tokens: wire.usage.input_tokens,
            output_tokens: wire.usage.output_tokens,
        })
    }
}

/// Caller-side contract: the service is told to answer in plain text with
/// numbered lists only, no markdown formatting.
fn build_system_prompt(request: &InsightRequest) -> VinePulseResult<String> {
    let mut prompt = String::from(
        "You are an analyst for a winery's email marketing program. \
         Answer in plain text. Use numbered lists for enumerations. \
         Do not use markdown formatting such as asterisks, headers, or code blocks. \
         Ground every observation in the metrics provided.",
    );

    if let Some(metrics) = &request.metrics {
        prompt.push_str("\n\nCurrent account metrics:\n");
        prompt.push_str(&serde_json::to_string_pretty(metrics)?);
    }
    if !request.campaigns.is_empty() {
        prompt.push_str("\n\nRecent campaigns:\n");
        prompt.push_str(&serde_json::to_string_pretty(&request.campaigns)?);
    }

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_truncates_to_window() {
        let mut context = ConversationContext::new();
        for i in 0..25 {
            let role = if i % 2 == 0 {
                TurnRole::User
            } else {
                TurnRole::Assistant
            };
            context.push(role, format!("turn {i}"));
        }
        assert_eq!(context.turns().len(), HISTORY_WINDOW);
        assert_eq!(context.turns()[0].content, "turn 15");
        assert_eq!(context.turns()[9].content, "turn 24");
    }

    #[test]
    fn test_system_prompt_embeds_metrics() {
        let request = InsightRequest {
            query: "How is engagement trending?".into(),
            metrics: Some(AggregateMetrics {
                total_campaigns: 12,
                average_open_rate: 52.25,
                ..AggregateMetrics::default()
            }),
            campaigns: vec![],
        };
        let prompt = build_system_prompt(&request).unwrap();
        assert!(prompt.contains("52.25"));
        assert!(prompt.contains("numbered lists"));
    }

    #[test]
    fn test_wire_response_decoding() {
        let raw = r#"{
            "content": [{ "type": "text", "text": "1. Open rates are strong." }],
            "model": "claude-3-5-sonnet-20241022",
            "usage": { "input_tokens": 812, "output_tokens": 96 }
        }"#;
        let wire: WireResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(wire.usage.output_tokens, 96);
        assert_eq!(wire.content[0].text, "1. Open rates are strong.");
    }
}
