use async_trait::async_trait;
use cryptotrack_market_data::{ChartPoint, MarketAsset};

use super::model::{DataSource, Endpoint, Served};
use crate::errors::Result;

/// Read side of the gateway as seen by the HTTP layer.
///
/// Neither read fails because of the upstream: when it cannot answer, the
/// payload is stale or synthetic and [`Served::source`] says which.
#[async_trait]
pub trait GatewayServiceTrait: Send + Sync {
    /// Top assets by market cap. `limit` is resolved against the configured
    /// default and cap before anything else happens.
    async fn market_listing(&self, limit: Option<u32>) -> Served<MarketAsset>;

    /// Daily price history of `coin_id`, ascending by timestamp.
    ///
    /// Fails only with [`Error::ClientInput`](crate::Error::ClientInput)
    /// for a blank identifier.
    async fn chart_series(&self, coin_id: &str) -> Result<Served<ChartPoint>>;

    /// `Cache-Control` value advertised for a payload of `endpoint` taken
    /// from `source`. Degraded payloads get the short fallback lifetime.
    fn cache_control(&self, endpoint: Endpoint, source: DataSource) -> String;

    /// Evicts cache entries past their grace window. Returns how many went.
    fn sweep_caches(&self) -> usize;
}
