//! Demo data source — fixed illustrative account figures behind the same
//! trait as the live client, so the strategy is picked by configuration
//! and never by silently swallowing an upstream failure.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use vinepulse_core::types::CampaignSummary;
use vinepulse_core::VinePulseResult;

use crate::marketing::{CampaignEngagement, ListSummary, MarketingApi};

/// Serves a small winery account snapshot without any network calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoSource;

impl DemoSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MarketingApi for DemoSource {
    async fn campaigns(&self, page_size: u32) -> VinePulseResult<Vec<CampaignSummary>> {
        let now = Utc::now();
        let seeds: [(&str, &str, u64, u64, u64, f64); 5] = [
            ("demo-01", "Spring Release Announcement", 9600, 5100, 120, 8200.0),
            ("demo-02", "Wine Club Exclusive Offer", 150, 96, 18, 4300.0),
            ("demo-03", "Harvest Festival Invitation", 9400, 4700, 90, 2100.0),
            ("demo-04", "Holiday Gift Guide", 9800, 5300, 140, 12_400.0),
            ("demo-05", "Library Wines Restock", 7200, 3500, 75, 6000.0),
        ];

        let campaigns = seeds
            .iter()
            .take(page_size as usize)
            .enumerate()
            .map(|(i, (id, name, recipients, opens, clicks, revenue))| {
                CampaignSummary {
                    id: (*id).to_string(),
                    name: (*name).to_string(),
                    status: "sent".to_string(),
                    created_at: Some(now - Duration::days(14 * (i as i64 + 1))),
                    sent_at: Some(now - Duration::days(14 * (i as i64 + 1) - 2)),
                    recipient_count: *recipients,
                    open_count: *opens,
                    click_count: *clicks,
                    open_rate: 0.0,
                    click_rate: 0.0,
                    revenue: *revenue,
                }
                .with_rates()
            })
            .collect();

        Ok(campaigns)
    }

    async fn campaign_engagement(&self, _campaign_id: &str) -> VinePulseResult<CampaignEngagement> {
        Ok(CampaignEngagement {
            recipients: 9600,
            opens: 5100,
            clicks: 120,
            revenue: 8200.0,
        })
    }

    async fn profile_total(&self) -> VinePulseResult<u64> {
        Ok(9822)
    }

    async fn lists(&self) -> VinePulseResult<Vec<ListSummary>> {
        Ok(vec![
            ListSummary {
                id: "list-news".to_string(),
                name: "Newsletter".to_string(),
                profile_count: 9822,
            },
            ListSummary {
                id: "list-club".to_string(),
                name: "VIP Wine Club".to_string(),
                profile_count: 150,
            },
            ListSummary {
                id: "list-events".to_string(),
                name: "Tasting Room Events".to_string(),
                profile_count: 1240,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_campaigns_have_rates() {
        let source = DemoSource::new();
        let campaigns = source.campaigns(100).await.unwrap();
        assert_eq!(campaigns.len(), 5);
        for c in &campaigns {
            assert!(c.open_rate > 0.0 && c.open_rate <= 100.0);
            assert!(c.click_rate > 0.0 && c.click_rate <= 100.0);
        }
    }

    #[tokio::test]
    async fn test_demo_page_size_respected() {
        let source = DemoSource::new();
        let campaigns = source.campaigns(2).await.unwrap();
        assert_eq!(campaigns.len(), 2);
    }

    #[tokio::test]
    async fn test_demo_club_list_present() {
        let source = DemoSource::new();
        let lists = source.lists().await.unwrap();
        assert!(lists.iter().any(|l| l.name.to_lowercase().contains("club")));
    }
}
