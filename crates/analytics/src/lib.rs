//! Metrics aggregation and synthetic time-series generation — reduces
//! paginated upstream resources into dashboard figures and synthesizes
//! illustrative daily histories for charting.

pub mod reducer;
pub mod series;

pub use reducer::MetricsReducer;
pub use series::{generate_series, generate_series_with, MetricKind, SeriesGenerator};
