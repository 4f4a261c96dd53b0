//! Gateway domain types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cryptotrack_market_data::MarketDataError;
use thiserror::Error;

use crate::errors::{Error, Result};

// =============================================================================
// Configuration
// =============================================================================

/// Freshness windows and request limits of the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// How long an upstream listing stays fresh (default: 60s)
    pub markets_ttl: Duration,

    /// How long an upstream chart series stays fresh (default: 60s)
    pub chart_ttl: Duration,

    /// How long a synthetic payload is cached; zero disables caching (default: 15s)
    pub fallback_ttl: Duration,

    /// How long an expired upstream payload may still be served after a failure (default: 300s)
    pub stale_grace: Duration,

    /// Listing size when the caller gives none (default: 50)
    pub default_limit: u32,

    /// Upper bound for the listing size (default: 250)
    pub max_limit: u32,

    /// Days of history in a chart series (default: 7)
    pub chart_days: u32,

    /// Seed of the synthetic data generator; random per process when unset
    pub fallback_seed: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            markets_ttl: Duration::from_secs(60),
            chart_ttl: Duration::from_secs(60),
            fallback_ttl: Duration::from_secs(15),
            stale_grace: Duration::from_secs(300),
            default_limit: 50,
            max_limit: 250,
            chart_days: 7,
            fallback_seed: None,
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_limit == 0 {
            return Err(Error::InvalidConfigValue(
                "max_limit must be at least 1".to_string(),
            ));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(Error::InvalidConfigValue(format!(
                "default_limit must be between 1 and {}, got {}",
                self.max_limit, self.default_limit
            )));
        }
        if self.chart_days == 0 {
            return Err(Error::InvalidConfigValue(
                "chart_days must be at least 1".to_string(),
            ));
        }
        if self.markets_ttl.is_zero() || self.chart_ttl.is_zero() {
            return Err(Error::InvalidConfigValue(
                "cache TTLs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective listing size: absent or zero means the default, anything
    /// above the cap is clamped to it.
    pub fn resolve_limit(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.default_limit,
            Some(limit) => limit.min(self.max_limit),
        }
    }

    pub fn ttl_for(&self, endpoint: Endpoint) -> Duration {
        match endpoint {
            Endpoint::Markets => self.markets_ttl,
            Endpoint::Chart => self.chart_ttl,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// The two cached read endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Markets,
    Chart,
}

/// Where a served payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Fetched from the upstream, possibly replayed from the cache.
    Upstream,
    /// An expired upstream payload served because a refresh failed.
    Stale,
    /// Generated locally because no upstream payload was available.
    Fallback,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upstream => "upstream",
            Self::Stale => "stale",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload as handed to the HTTP layer.
///
/// Items sit behind an `Arc` so cache hits and coalesced waiters share one
/// allocation instead of cloning the list.
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub items: Arc<Vec<T>>,
    pub source: DataSource,
}

impl<T> Served<T> {
    pub fn new(items: Vec<T>, source: DataSource) -> Self {
        Self {
            items: Arc::new(items),
            source,
        }
    }

    pub fn upstream(items: Vec<T>) -> Self {
        Self::new(items, DataSource::Upstream)
    }

    pub fn fallback(items: Vec<T>) -> Self {
        Self::new(items, DataSource::Fallback)
    }

    /// Same items relabelled as stale.
    pub fn into_stale(self) -> Self {
        Self {
            items: self.items,
            source: DataSource::Stale,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Why a cache population attempt produced nothing.
///
/// Cloneable so one failure can be handed to every coalesced waiter.
#[derive(Error, Debug, Clone)]
pub enum UpstreamFailure {
    #[error("not known upstream")]
    NotFound,

    #[error("{0}")]
    Transient(Arc<MarketDataError>),
}

impl From<MarketDataError> for UpstreamFailure {
    fn from(err: MarketDataError) -> Self {
        if err.is_not_found() {
            Self::NotFound
        } else {
            Self::Transient(Arc::new(err))
        }
    }
}
