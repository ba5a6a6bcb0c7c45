//! Integration test for the full fetch-reduce-export flow against an
//! in-memory upstream. No network required.

use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use vinepulse_analytics::series::{generate_series_with, SeriesGenerator};
use vinepulse_analytics::MetricsReducer;
use vinepulse_core::types::{CampaignSummary, Period};
use vinepulse_core::{VinePulseError, VinePulseResult};
use vinepulse_integrations::marketing::{CampaignEngagement, ListSummary, MarketingApi};
use vinepulse_reporting::ReportAssembler;

/// In-memory upstream serving a fixed winery account.
struct FixtureApi {
    fail_lists: bool,
    fail_profiles: bool,
}

impl FixtureApi {
    fn healthy() -> Self {
        Self {
            fail_lists: false,
            fail_profiles: false,
        }
    }
}

fn fixture_campaign(id: &str, recipients: u64, opens: u64, clicks: u64) -> CampaignSummary {
    CampaignSummary {
        id: id.to_string(),
        name: format!("Campaign {id}"),
        status: "sent".to_string(),
        created_at: None,
        sent_at: None,
        recipient_count: recipients,
        open_count: opens,
        click_count: clicks,
        open_rate: 0.0,
        click_rate: 0.0,
        revenue: 0.0,
    }
}

#[async_trait]
impl MarketingApi for FixtureApi {
    async fn campaigns(&self, page_size: u32) -> VinePulseResult<Vec<CampaignSummary>> {
        // Open rates 10..50 and click rates 1..5 through the raw counts.
        let campaigns = vec![
            fixture_campaign("c1", 1000, 100, 10),
            fixture_campaign("c2", 1000, 200, 20),
            fixture_campaign("c3", 1000, 300, 30),
            fixture_campaign("c4", 1000, 400, 40),
            fixture_campaign("c5", 1000, 500, 50),
        ];
        Ok(campaigns.into_iter().take(page_size as usize).collect())
    }

    async fn campaign_engagement(&self, campaign_id: &str) -> VinePulseResult<CampaignEngagement> {
        match campaign_id {
            "c1" => Ok(CampaignEngagement {
                recipients: 1000,
                opens: 100,
                clicks: 10,
                revenue: 120.0,
            }),
            "c2" => Ok(CampaignEngagement {
                recipients: 1000,
                opens: 200,
                clicks: 20,
                revenue: 0.0,
            }),
            "c3" => Ok(CampaignEngagement {
                recipients: 1000,
                opens: 300,
                clicks: 30,
                revenue: 55.0,
            }),
            "c4" => Ok(CampaignEngagement {
                recipients: 1000,
                opens: 400,
                clicks: 40,
                revenue: 0.0,
            }),
            "c5" => Ok(CampaignEngagement {
                recipients: 1000,
                opens: 500,
                clicks: 50,
                revenue: 25.0,
            }),
            _ => Err(VinePulseError::Upstream("unknown campaign".into())),
        }
    }

    async fn profile_total(&self) -> VinePulseResult<u64> {
        if self.fail_profiles {
            Err(VinePulseError::Upstream("profiles unavailable".into()))
        } else {
            Ok(9822)
        }
    }

    async fn lists(&self) -> VinePulseResult<Vec<ListSummary>> {
        if self.fail_lists {
            return Err(VinePulseError::Upstream("lists unavailable".into()));
        }
        Ok(vec![
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
        ])
    }
}

#[tokio::test]
async fn test_end_to_end_aggregate() {
    let reducer = MetricsReducer::new(Arc::new(FixtureApi::healthy()), 100);
    let aggregate = reducer.fetch_winery_aggregate().await;

    assert_eq!(aggregate.total_campaigns, 5);
    assert_eq!(aggregate.total_subscribers, 9822);
    assert_eq!(aggregate.average_open_rate, 30.0);
    assert_eq!(aggregate.average_click_rate, 3.0);
    assert_eq!(aggregate.total_revenue, 200.0);
    assert_eq!(aggregate.wine_club_members, 150);
    assert_eq!(aggregate.wine_club_revenue, 70.0);
}

#[tokio::test]
async fn test_aggregate_with_failing_branches_still_settles() {
    let api = FixtureApi {
        fail_lists: true,
        fail_profiles: true,
    };
    let reducer = MetricsReducer::new(Arc::new(api), 100);
    let aggregate = reducer.fetch_winery_aggregate().await;

    // Failed branches default; the campaign branch still contributes.
    assert_eq!(aggregate.total_subscribers, 0);
    assert_eq!(aggregate.wine_club_members, 0);
    assert_eq!(aggregate.total_campaigns, 5);
    assert_eq!(aggregate.average_open_rate, 30.0);
}

#[tokio::test]
async fn test_summaries_feed_csv_export() {
    let reducer = MetricsReducer::new(Arc::new(FixtureApi::healthy()), 100);
    let campaigns = reducer.fetch_campaign_summaries(100).await.unwrap();
    let csv = ReportAssembler::campaigns_csv(&campaigns);

    // Header plus five data rows.
    assert_eq!(csv.lines().count(), 6);
    assert!(csv.contains("Campaign c1"));
    assert!(csv.contains("10.00"));
    assert!(csv.contains("120"));
}

#[tokio::test]
async fn test_subscribers_export_uses_aggregate() {
    let reducer = MetricsReducer::new(Arc::new(FixtureApi::healthy()), 100);
    let aggregate = reducer.fetch_winery_aggregate().await;
    let mut rng = StdRng::seed_from_u64(21);
    let csv = ReportAssembler::subscribers_csv(&aggregate, &mut rng);
    assert_eq!(csv.lines().count(), 31);
}

#[test]
fn test_series_shape_for_all_periods() {
    for period in Period::ALL {
        let points = generate_series_with("revenue", period, true, 13);
        assert_eq!(points.len(), period.days() as usize + 1);
        for pair in points.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        assert!(points.iter().all(|p| p.previous_year_value.is_some()));
    }
}

#[test]
fn test_series_anchored_generation_is_stable() {
    let anchor = chrono::NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
    let mut rng_a = StdRng::seed_from_u64(99);
    let mut rng_b = StdRng::seed_from_u64(99);
    let a = SeriesGenerator::generate_from(anchor, "openRate", Period::Days30, false, &mut rng_a);
    let b = SeriesGenerator::generate_from(anchor, "openRate", Period::Days30, false, &mut rng_b);
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.value, y.value);
    }
    assert_eq!(a.last().unwrap().date, anchor);
    assert_eq!(a.first().unwrap().date, anchor - chrono::Duration::days(30));
}
