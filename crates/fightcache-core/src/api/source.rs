use async_trait::async_trait;

use crate::models::OddsChartPoint;

use super::client::ApiClient;
use super::error::ApiResult;
use super::types::{ApiEvent, ApiFighter};

/// Where the sync layer gets remote data from.
///
/// `ApiClient` is the production implementation. Fetches must be safe to run
/// concurrently; the sync manager issues all three batch fetches at once.
#[async_trait]
pub trait FightDataSource: Send + Sync {
    async fn fetch_fighters(&self) -> ApiResult<Vec<ApiFighter>>;

    async fn fetch_events(&self) -> ApiResult<Vec<ApiEvent>>;

    /// Upcoming bouts, already flattened to one record per bout.
    async fn fetch_upcoming_events(&self) -> ApiResult<Vec<ApiEvent>>;

    async fn fetch_odds_chart(&self, fighter: &str) -> ApiResult<Vec<OddsChartPoint>>;
}

#[async_trait]
impl FightDataSource for ApiClient {
    async fn fetch_fighters(&self) -> ApiResult<Vec<ApiFighter>> {
        ApiClient::fetch_fighters(self).await
    }

    async fn fetch_events(&self) -> ApiResult<Vec<ApiEvent>> {
        ApiClient::fetch_events(self).await
    }

    async fn fetch_upcoming_events(&self) -> ApiResult<Vec<ApiEvent>> {
        ApiClient::fetch_upcoming_events(self).await
    }

    async fn fetch_odds_chart(&self, fighter: &str) -> ApiResult<Vec<OddsChartPoint>> {
        ApiClient::fetch_odds_chart(self, fighter).await
    }
}
