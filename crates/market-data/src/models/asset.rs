use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One entry of the aggregate market listing.
///
/// Field names follow the listing contract consumed by clients; every field is
/// required and a record missing any of them is never served.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MarketAsset {
    /// Provider coin identifier, e.g. `bitcoin`
    pub id: String,

    /// Ticker symbol in lower case, e.g. `btc`
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Logo URI
    pub image: String,

    /// Spot price in USD
    #[schema(value_type = f64)]
    pub current_price: Decimal,

    #[schema(value_type = f64)]
    pub market_cap: Decimal,

    /// 24h traded volume in USD
    #[schema(value_type = f64)]
    pub total_volume: Decimal,

    #[schema(value_type = f64)]
    pub price_change_percentage_24h: Decimal,
}
