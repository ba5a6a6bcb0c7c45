//! Marketing platform trait — one seam for the live client and the demo
//! strategy, selected by configuration rather than silent fallback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vinepulse_core::types::CampaignSummary;
use vinepulse_core::VinePulseResult;

/// A named grouping of subscriber profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSummary {
    pub id: String,
    pub name: String,
    pub profile_count: u64,
}

/// Engagement figures for a single campaign, from the metrics sub-call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CampaignEngagement {
    pub recipients: u64,
    pub opens: u64,
    pub clicks: u64,
    pub revenue: f64,
}

/// Paginated upstream resources, reduced to what the dashboard consumes.
#[async_trait]
pub trait MarketingApi: Send + Sync {
    /// Email-channel campaigns, one page of at most `page_size`.
    /// Engagement fields are left zeroed; callers enrich them per campaign.
    async fn campaigns(&self, page_size: u32) -> VinePulseResult<Vec<CampaignSummary>>;

    /// Engagement figures for one campaign. Callers treat a failure here
    /// as zeroes, never as a failure of the whole fetch.
    async fn campaign_engagement(&self, campaign_id: &str) -> VinePulseResult<CampaignEngagement>;

    /// Total profile count. `meta.total` from the upstream is authoritative.
    async fn profile_total(&self) -> VinePulseResult<u64>;

    /// All lists with their profile counts.
    async fn lists(&self) -> VinePulseResult<Vec<ListSummary>>;
}
