//! Metrics Reducer — converts paginated upstream resources into the flat
//! summary figures consumed by dashboards, reports, and the insight client.
//!
//! Failure policy: a failed branch of the aggregate fan-out substitutes a
//! zero/empty default; the aggregate call itself never fails for partial
//! upstream failure.

use std::sync::Arc;

use tracing::warn;
use vinepulse_core::types::{AggregateMetrics, CampaignSummary, SeasonalSales};
use vinepulse_core::VinePulseResult;
use vinepulse_integrations::marketing::MarketingApi;

/// Share of total revenue attributed to the wine club.
const CLUB_REVENUE_SHARE: f64 = 0.35;
const CLUB_RETENTION_RATE: f64 = 0.85;

/// Name fragments identifying a wine-club list, checked case-insensitively.
const CLUB_NAME_FRAGMENTS: [&str; 3] = ["wine club", "wine-club", "club"];

pub struct MetricsReducer {
    api: Arc<dyn MarketingApi>,
    campaign_page_size: u32,
}

impl MetricsReducer {
    pub fn new(api: Arc<dyn MarketingApi>, campaign_page_size: u32) -> Self {
        Self {
            api,
            campaign_page_size,
        }
    }

    /// Email-channel campaigns enriched with per-campaign engagement.
    /// A failed engagement sub-call zeroes that campaign's figures and
    /// processing continues for the remainder.
    pub async fn fetch_campaign_summaries(
        &self,
        page_size: u32,
    ) -> VinePulseResult<Vec<CampaignSummary>> {
        let campaigns = self.api.campaigns(page_size).await?;

        let mut enriched = Vec::with_capacity(campaigns.len());
        for mut campaign in campaigns {
            match self.api.campaign_engagement(&campaign.id).await {
                Ok(engagement) => {
                    campaign.recipient_count = engagement.recipients;
                    campaign.open_count = engagement.opens;
                    campaign.click_count = engagement.clicks;
                    campaign.revenue = engagement.revenue;
                }
                Err(e) => {
                    warn!(campaign_id = %campaign.id, error = %e,
                        "Campaign engagement fetch failed, defaulting to zero");
                }
            }
            enriched.push(campaign.with_rates());
        }

        Ok(enriched)
    }

    /// Account-wide aggregate from three concurrent upstream fetches.
    /// Each branch settles independently; a failure in one never cancels
    /// or blocks the others.
    pub async fn fetch_winery_aggregate(&self) -> AggregateMetrics {
        let (profiles, lists, campaigns) = tokio::join!(
            self.api.profile_total(),
            self.api.lists(),
            self.fetch_campaign_summaries(self.campaign_page_size),
        );

        let total_subscribers = profiles.unwrap_or_else(|e| {
            warn!(error = %e, "Profile count fetch failed, defaulting to zero");
            0
        });
        let lists = lists.unwrap_or_else(|e| {
            warn!(error = %e, "List fetch failed, defaulting to empty");
            Vec::new()
        });
        let campaigns = campaigns.unwrap_or_else(|e| {
            warn!(error = %e, "Campaign fetch failed, defaulting to empty");
            Vec::new()
        });

        let total_revenue: f64 = campaigns.iter().map(|c| c.revenue).sum();
        let average_open_rate = mean(campaigns.iter().map(|c| c.open_rate));
        let average_click_rate = mean(campaigns.iter().map(|c| c.click_rate));

        let wine_club_members = lists
            .iter()
            .find(|list| {
                let name = list.name.to_lowercase();
                CLUB_NAME_FRAGMENTS.iter().any(|f| name.contains(f))
            })
            .map(|list| list.profile_count)
            .unwrap_or(0);

        AggregateMetrics {
            total_campaigns: campaigns.len() as u64,
            total_subscribers,
            average_open_rate,
            average_click_rate,
            total_revenue,
            wine_club_members,
            wine_club_revenue: total_revenue * CLUB_REVENUE_SHARE,
            wine_club_retention_rate: CLUB_RETENTION_RATE,
            seasonal_sales: SeasonalSales::default(),
        }
    }
}

/// Unweighted arithmetic mean; 0 for an empty set.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u64), |(s, n), v| (s + v, n + 1));
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vinepulse_core::VinePulseError;
    use vinepulse_integrations::marketing::{CampaignEngagement, ListSummary};

    /// Scriptable upstream: each branch either serves fixed data or fails.
    struct ScriptedApi {
        campaigns: Result<Vec<CampaignSummary>, ()>,
        engagement: Result<CampaignEngagement, ()>,
        profile_total: Result<u64, ()>,
        lists: Result<Vec<ListSummary>, ()>,
    }

    impl Default for ScriptedApi {
        fn default() -> Self {
            Self {
                campaigns: Ok(Vec::new()),
                engagement: Ok(CampaignEngagement::default()),
                profile_total: Ok(0),
                lists: Ok(Vec::new()),
            }
        }
    }

    fn upstream_err() -> VinePulseError {
        VinePulseError::Upstream("scripted failure".into())
    }

    #[async_trait]
    impl MarketingApi for ScriptedApi {
        async fn campaigns(&self, page_size: u32) -> VinePulseResult<Vec<CampaignSummary>> {
            self.campaigns
                .clone()
                .map(|c| c.into_iter().take(page_size as usize).collect())
                .map_err(|_| upstream_err())
        }

        async fn campaign_engagement(
            &self,
            _campaign_id: &str,
        ) -> VinePulseResult<CampaignEngagement> {
            self.engagement.map_err(|_| upstream_err())
        }

        async fn profile_total(&self) -> VinePulseResult<u64> {
            self.profile_total.map_err(|_| upstream_err())
        }

        async fn lists(&self) -> VinePulseResult<Vec<ListSummary>> {
            self.lists.clone().map_err(|_| upstream_err())
        }
    }

    fn campaign(id: &str, open_rate: f64, click_rate: f64, revenue: f64) -> CampaignSummary {
        CampaignSummary {
            id: id.to_string(),
            name: format!("Campaign {id}"),
            status: "sent".to_string(),
            created_at: None,
            sent_at: None,
            recipient_count: 0,
            open_count: 0,
            click_count: 0,
            open_rate,
            click_rate,
            revenue,
        }
    }

    fn reducer(api: ScriptedApi) -> MetricsReducer {
        MetricsReducer::new(Arc::new(api), 100)
    }

    #[tokio::test]
    async fn test_aggregate_survives_every_branch_failing() {
        let api = ScriptedApi {
            campaigns: Err(()),
            profile_total: Err(()),
            lists: Err(()),
            ..ScriptedApi::default()
        };
        let aggregate = reducer(api).fetch_winery_aggregate().await;
        assert_eq!(aggregate.total_campaigns, 0);
        assert_eq!(aggregate.total_subscribers, 0);
        assert_eq!(aggregate.average_open_rate, 0.0);
        assert_eq!(aggregate.total_revenue, 0.0);
    }

    #[tokio::test]
    async fn test_aggregate_partial_failure_keeps_other_branches() {
        let api = ScriptedApi {
            campaigns: Err(()),
            profile_total: Ok(9822),
            lists: Ok(vec![ListSummary {
                id: "l1".into(),
                name: "VIP Wine Club".into(),
                profile_count: 150,
            }]),
            ..ScriptedApi::default()
        };
        let aggregate = reducer(api).fetch_winery_aggregate().await;
        assert_eq!(aggregate.total_subscribers, 9822);
        assert_eq!(aggregate.wine_club_members, 150);
        assert_eq!(aggregate.total_campaigns, 0);
    }

    #[tokio::test]
    async fn test_unweighted_rate_averaging() {
        // Open rates 10..50, click rates 1..5, expressed through counts so
        // with_rates derives them after the failed engagement sub-calls.
        let api = ScriptedApi {
            campaigns: Ok(vec![
                campaign_with_counts("c1", 1000, 100, 10, 100.0),
                campaign_with_counts("c2", 1000, 200, 20, 0.0),
                campaign_with_counts("c3", 1000, 300, 30, 50.0),
                campaign_with_counts("c4", 1000, 400, 40, 0.0),
                campaign_with_counts("c5", 1000, 500, 50, 25.0),
            ]),
            engagement: Err(()),
            ..ScriptedApi::default()
        };
        let aggregate = reducer(api).fetch_winery_aggregate().await;
        assert_eq!(aggregate.average_open_rate, 30.0);
        assert_eq!(aggregate.average_click_rate, 3.0);
        assert_eq!(aggregate.total_revenue, 175.0);
        assert_eq!(aggregate.wine_club_revenue, 175.0 * 0.35);
    }

    fn campaign_with_counts(
        id: &str,
        recipients: u64,
        opens: u64,
        clicks: u64,
        revenue: f64,
    ) -> CampaignSummary {
        CampaignSummary {
            recipient_count: recipients,
            open_count: opens,
            click_count: clicks,
            ..campaign(id, 0.0, 0.0, revenue)
        }
    }

    #[tokio::test]
    async fn test_empty_campaign_set_has_zero_averages() {
        let api = ScriptedApi::default();
        let aggregate = reducer(api).fetch_winery_aggregate().await;
        assert_eq!(aggregate.average_open_rate, 0.0);
        assert_eq!(aggregate.average_click_rate, 0.0);
    }

    #[tokio::test]
    async fn test_club_detection_is_case_insensitive_first_match() {
        let api = ScriptedApi {
            lists: Ok(vec![
                ListSummary {
                    id: "l1".into(),
                    name: "Newsletter".into(),
                    profile_count: 9000,
                },
                ListSummary {
                    id: "l2".into(),
                    name: "VIP Wine Club".into(),
                    profile_count: 150,
                },
                ListSummary {
                    id: "l3".into(),
                    name: "Supper Club".into(),
                    profile_count: 75,
                },
            ]),
            ..ScriptedApi::default()
        };
        let aggregate = reducer(api).fetch_winery_aggregate().await;
        assert_eq!(aggregate.wine_club_members, 150);
    }

    #[tokio::test]
    async fn test_no_club_list_means_zero_members() {
        let api = ScriptedApi {
            lists: Ok(vec![ListSummary {
                id: "l1".into(),
                name: "Newsletter".into(),
                profile_count: 9000,
            }]),
            ..ScriptedApi::default()
        };
        let aggregate = reducer(api).fetch_winery_aggregate().await;
        assert_eq!(aggregate.wine_club_members, 0);
    }

    #[tokio::test]
    async fn test_engagement_failure_zeroes_single_campaign() {
        let api = ScriptedApi {
            campaigns: Ok(vec![campaign("c1", 0.0, 0.0, 0.0)]),
            engagement: Err(()),
            ..ScriptedApi::default()
        };
        let summaries = reducer(api).fetch_campaign_summaries(100).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].open_rate, 0.0);
        assert_eq!(summaries[0].recipient_count, 0);
    }

    #[tokio::test]
    async fn test_engagement_success_derives_rates() {
        let api = ScriptedApi {
            campaigns: Ok(vec![campaign("c1", 0.0, 0.0, 0.0)]),
            engagement: Ok(CampaignEngagement {
                recipients: 200,
                opens: 100,
                clicks: 10,
                revenue: 750.0,
            }),
            ..ScriptedApi::default()
        };
        let summaries = reducer(api).fetch_campaign_summaries(100).await.unwrap();
        assert_eq!(summaries[0].open_rate, 50.0);
        assert_eq!(summaries[0].click_rate, 5.0);
        assert_eq!(summaries[0].revenue, 750.0);
    }
}
