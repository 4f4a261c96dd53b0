//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - The concrete CoinGecko implementation
//!
//! Providers make a single attempt per call and report failures through
//! [`MarketDataError`](crate::errors::MarketDataError). Retry and outcome
//! classification live one level up, in [`UpstreamClient`](crate::UpstreamClient).

mod traits;

pub mod coingecko;

pub use traits::MarketDataProvider;
