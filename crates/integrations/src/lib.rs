//! External collaborators — the upstream marketing platform API and the
//! hosted AI insight service.

pub mod demo;
pub mod insight;
pub mod klaviyo;
pub mod marketing;

pub use demo::DemoSource;
pub use insight::{ConversationContext, InsightClient, InsightRequest, InsightResponse};
pub use klaviyo::KlaviyoClient;
pub use marketing::{CampaignEngagement, ListSummary, MarketingApi};
