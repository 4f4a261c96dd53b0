//! Cryptotrack Market Data Crate
//!
//! This crate talks to the upstream crypto market data provider and knows how
//! to stand in for it.
//!
//! # Overview
//!
//! - Data model served by the gateway: [`MarketAsset`], [`ChartPoint`]
//! - Upstream error taxonomy with retry classification: [`errors`]
//! - Provider abstraction and the CoinGecko implementation: [`provider`]
//! - Retrying facade producing a tagged [`UpstreamOutcome`]: [`UpstreamClient`]
//! - Deterministic synthetic data: [`FallbackGenerator`]
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +--------------------+
//! |  UpstreamClient  | --> | MarketDataProvider |  (CoinGecko, mocks)
//! +------------------+     +--------------------+
//!          |
//!          v
//!  UpstreamOutcome { Success | NotFound | TransientFailure }
//! ```

pub mod client;
pub mod errors;
pub mod fallback;
pub mod models;
pub mod provider;

pub use client::{RetryPolicy, UpstreamClient, UpstreamOutcome, DEFAULT_RETRY_BACKOFF};
pub use errors::{MarketDataError, RetryClass};
pub use fallback::{demo_assets, FallbackGenerator};
pub use models::{sort_by_timestamp, ChartPoint, MarketAsset};
pub use provider::coingecko::{CoinGeckoConfig, CoinGeckoProvider};
pub use provider::MarketDataProvider;
