//! CoinGecko v3 wire types.
//!
//! Every field is optional at the wire level so that missing or `null` values
//! surface as validation failures instead of opaque parse errors.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{ChartPoint, MarketAsset};

/// One row of `/coins/markets`.
#[derive(Debug, Deserialize)]
pub(crate) struct CoinMarketRow {
    pub id: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
}

/// Body of `/coins/{id}/market_chart`. Only `prices` is consumed.
#[derive(Debug, Deserialize)]
pub(crate) struct MarketChartResponse {
    #[serde(default)]
    pub prices: Option<Vec<(f64, f64)>>,
}

fn required<T>(value: Option<T>, index: usize, field: &str) -> Result<T, MarketDataError> {
    value.ok_or_else(|| MarketDataError::ValidationFailed {
        message: format!("record {} is missing {}", index, field),
    })
}

fn decimal(value: f64, index: usize, field: &str) -> Result<Decimal, MarketDataError> {
    Decimal::from_f64_retain(value).ok_or_else(|| MarketDataError::ValidationFailed {
        message: format!("record {} has a non-finite {}: {}", index, field, value),
    })
}

impl CoinMarketRow {
    /// Converts a wire row into a [`MarketAsset`], failing on the first
    /// absent required field.
    pub(crate) fn into_asset(self, index: usize) -> Result<MarketAsset, MarketDataError> {
        let current_price = required(self.current_price, index, "current_price")?;
        let market_cap = required(self.market_cap, index, "market_cap")?;
        let total_volume = required(self.total_volume, index, "total_volume")?;
        let change = required(
            self.price_change_percentage_24h,
            index,
            "price_change_percentage_24h",
        )?;

        Ok(MarketAsset {
            id: required(self.id, index, "id")?,
            symbol: required(self.symbol, index, "symbol")?,
            name: required(self.name, index, "name")?,
            image: required(self.image, index, "image")?,
            current_price: decimal(current_price, index, "current_price")?,
            market_cap: decimal(market_cap, index, "market_cap")?,
            total_volume: decimal(total_volume, index, "total_volume")?,
            price_change_percentage_24h: decimal(change, index, "price_change_percentage_24h")?,
        })
    }
}

impl MarketChartResponse {
    pub(crate) fn into_points(self) -> Result<Vec<ChartPoint>, MarketDataError> {
        let prices = self.prices.unwrap_or_default();
        if prices.is_empty() {
            return Err(MarketDataError::ValidationFailed {
                message: "market chart contains no prices".to_string(),
            });
        }

        prices
            .into_iter()
            .enumerate()
            .map(|(i, (ts, price))| {
                if !ts.is_finite() || ts <= 0.0 {
                    return Err(MarketDataError::ValidationFailed {
                        message: format!("point {} has an invalid timestamp: {}", i, ts),
                    });
                }
                Ok(ChartPoint::new(ts as i64, decimal(price, i, "price")?))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_change_is_treated_as_missing() {
        let json = r#"{
            "id": "newcoin", "symbol": "new", "name": "New Coin",
            "image": "https://example.com/new.png",
            "current_price": 1.5, "market_cap": 1000, "total_volume": 10,
            "price_change_percentage_24h": null
        }"#;
        let row: CoinMarketRow = serde_json::from_str(json).unwrap();

        let err = row.into_asset(4).unwrap_err();
        assert!(matches!(err, MarketDataError::ValidationFailed { .. }));
        assert!(err.to_string().contains("record 4"));
        assert!(err.to_string().contains("price_change_percentage_24h"));
    }

    #[test]
    fn test_chart_without_prices_is_invalid() {
        let body: MarketChartResponse = serde_json::from_str(r#"{"market_caps": []}"#).unwrap();
        assert!(matches!(
            body.into_points(),
            Err(MarketDataError::ValidationFailed { .. })
        ));
    }
}
