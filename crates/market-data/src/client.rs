//! Upstream client - retrying facade over a [`MarketDataProvider`].
//!
//! Callers never see a `Result` from this layer. Every call resolves to an
//! [`UpstreamOutcome`], which the gateway consumes with an explicit decision
//! table instead of catching errors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::models::{ChartPoint, MarketAsset};
use crate::provider::MarketDataProvider;

/// Pause before the single retry of a transient failure.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Result of one logical upstream call, retries included.
#[derive(Debug)]
pub enum UpstreamOutcome<T> {
    /// The provider returned a payload that passed validation.
    Success(T),
    /// The provider explicitly does not know the requested identifier.
    NotFound,
    /// Network, timeout, rate limit, non-2xx, malformed or invalid payload.
    TransientFailure(MarketDataError),
}

impl<T> UpstreamOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    fn from_error(err: MarketDataError) -> Self {
        if err.is_not_found() {
            Self::NotFound
        } else {
            Self::TransientFailure(err)
        }
    }
}

/// Retry behaviour of the upstream client.
///
/// At most one retry is ever made, and only for errors classified
/// [`RetryClass::WithBackoff`].
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub retry_transient: bool,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_transient: true,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Policy that gives up after the first failure.
    pub fn no_retry() -> Self {
        Self {
            retry_transient: false,
            backoff: Duration::ZERO,
        }
    }
}

/// Upstream client - wraps a provider with retry and outcome classification.
pub struct UpstreamClient {
    provider: Arc<dyn MarketDataProvider>,
    retry: RetryPolicy,
}

impl UpstreamClient {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::with_retry_policy(provider, RetryPolicy::default())
    }

    pub fn with_retry_policy(provider: Arc<dyn MarketDataProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    /// Top `limit` assets by market cap.
    pub async fn fetch_markets(&self, limit: u32) -> UpstreamOutcome<Vec<MarketAsset>> {
        let provider = self.provider.clone();
        self.call("markets", || {
            let provider = provider.clone();
            async move { provider.get_markets(limit).await }
        })
        .await
    }

    /// Price history of `coin_id` over the last `days` days.
    pub async fn fetch_chart(&self, coin_id: &str, days: u32) -> UpstreamOutcome<Vec<ChartPoint>> {
        let provider = self.provider.clone();
        self.call("chart", || {
            let provider = provider.clone();
            let coin_id = coin_id.to_string();
            async move { provider.get_market_chart(&coin_id, days).await }
        })
        .await
    }

    async fn call<T, F, Fut>(&self, operation: &str, mut attempt: F) -> UpstreamOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let provider_id = self.provider.id();
        info!("Fetching {} from {}", operation, provider_id);

        let err = match attempt().await {
            Ok(payload) => return UpstreamOutcome::Success(payload),
            Err(err) => err,
        };

        if !self.retry.retry_transient || err.retry_class() == RetryClass::Never {
            debug!(
                "{} {} failed without retry: {}",
                provider_id, operation, err
            );
            return UpstreamOutcome::from_error(err);
        }

        warn!(
            "{} {} failed ({}), retrying in {:?}",
            provider_id, operation, err, self.retry.backoff
        );
        tokio::time::sleep(self.retry.backoff).await;

        match attempt().await {
            Ok(payload) => UpstreamOutcome::Success(payload),
            Err(err) => {
                warn!("{} {} failed after retry: {}", provider_id, operation, err);
                UpstreamOutcome::from_error(err)
            }
        }
    }
}
