//! Records served by the gateway.
//!
//! - `asset` - One row of the aggregate market listing (MarketAsset)
//! - `chart` - One daily price sample (ChartPoint)

mod asset;
mod chart;

pub use asset::MarketAsset;
pub use chart::{sort_by_timestamp, ChartPoint};
