//! Shared data model for the metrics pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single outbound email send, reduced from the upstream campaign
/// resource. Constructed per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub id: String,
    pub name: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub recipient_count: u64,
    pub open_count: u64,
    pub click_count: u64,
    /// Percentage of recipients who opened; 0 when recipient_count is 0.
    pub open_rate: f64,
    /// Percentage of recipients who clicked; 0 when recipient_count is 0.
    pub click_rate: f64,
    pub revenue: f64,
}

impl CampaignSummary {
    /// Derive the rate fields from the raw counts.
    pub fn with_rates(mut self) -> Self {
        if self.recipient_count > 0 {
            self.open_rate = self.open_count as f64 / self.recipient_count as f64 * 100.0;
            self.click_rate = self.click_count as f64 / self.recipient_count as f64 * 100.0;
        } else {
            self.open_rate = 0.0;
            self.click_rate = 0.0;
        }
        self
    }
}

/// Flat summary figures for the whole account, recomputed on every call.
/// Averages are unweighted arithmetic means over the fetched campaign set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub total_campaigns: u64,
    pub total_subscribers: u64,
    pub average_open_rate: f64,
    pub average_click_rate: f64,
    pub total_revenue: f64,
    pub wine_club_members: u64,
    /// Revenue attributed to the wine club (35% of total).
    pub wine_club_revenue: f64,
    pub wine_club_retention_rate: f64,
    pub seasonal_sales: SeasonalSales,
}

impl Default for AggregateMetrics {
    fn default() -> Self {
        Self {
            total_campaigns: 0,
            total_subscribers: 0,
            average_open_rate: 0.0,
            average_click_rate: 0.0,
            total_revenue: 0.0,
            wine_club_members: 0,
            wine_club_revenue: 0.0,
            wine_club_retention_rate: 0.0,
            seasonal_sales: SeasonalSales::default(),
        }
    }
}

/// Fixed seasonal sales block carried on the aggregate payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalSales {
    pub spring: f64,
    pub summer: f64,
    pub fall: f64,
    pub winter: f64,
    pub peak_season: String,
    pub low_season: String,
    pub seasonal_variation: f64,
}

impl Default for SeasonalSales {
    fn default() -> Self {
        Self {
            spring: 15_000.0,
            summer: 12_000.0,
            fall: 18_000.0,
            winter: 10_000.0,
            peak_season: "fall".to_string(),
            low_season: "winter".to_string(),
            seasonal_variation: 0.8,
        }
    }
}

/// One day of a charted series. Points are ordered oldest-first and cover
/// consecutive calendar days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_year_value: Option<f64>,
}

/// Chartable lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "60d")]
    Days60,
    #[serde(rename = "90d")]
    Days90,
    #[serde(rename = "6m")]
    Months6,
    #[serde(rename = "1y")]
    Year1,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Days30,
        Period::Days60,
        Period::Days90,
        Period::Months6,
        Period::Year1,
    ];

    pub fn days(self) -> u32 {
        match self {
            Period::Days30 => 30,
            Period::Days60 => 60,
            Period::Days90 => 90,
            Period::Months6 => 180,
            Period::Year1 => 365,
        }
    }

    /// Parse the query-string form; anything unrecognised falls back to 90d.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "30d" => Period::Days30,
            "60d" => Period::Days60,
            "90d" => Period::Days90,
            "6m" => Period::Months6,
            "1y" => Period::Year1,
            _ => Period::Days90,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Days30 => "30d",
            Period::Days60 => "60d",
            Period::Days90 => "90d",
            Period::Months6 => "6m",
            Period::Year1 => "1y",
        }
    }
}
