use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single historical price observation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartPoint {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Price in USD at `timestamp`
    #[schema(value_type = f64)]
    pub price: Decimal,
}

impl ChartPoint {
    pub fn new(timestamp: i64, price: Decimal) -> Self {
        Self { timestamp, price }
    }
}

/// Orders a series by ascending timestamp. Stable, so equal timestamps keep
/// the provider's order.
pub fn sort_by_timestamp(points: &mut [ChartPoint]) {
    points.sort_by_key(|p| p.timestamp);
}
