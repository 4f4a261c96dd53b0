use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{ChartPoint, MarketAsset};

/// An upstream source of crypto listings and price history.
///
/// One call is one attempt. Implementations own the wire format and hand back
/// normalised records or a classified [`MarketDataError`]; retrying and the
/// success/not-found/transient split happen in
/// [`UpstreamClient`](crate::UpstreamClient).
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Constant name such as `"COINGECKO"`, used in logs and errors.
    fn id(&self) -> &'static str;

    /// Top `limit` assets by market cap, largest first.
    ///
    /// A record missing any listing field fails the whole call with
    /// `ValidationFailed`; so does a listing longer than `limit`.
    async fn get_markets(&self, limit: u32) -> Result<Vec<MarketAsset>, MarketDataError>;

    /// Daily prices of `coin_id` over the last `days` days, oldest first.
    ///
    /// `CoinNotFound` when the provider does not know the identifier.
    async fn get_market_chart(
        &self,
        coin_id: &str,
        days: u32,
    ) -> Result<Vec<ChartPoint>, MarketDataError>;
}
