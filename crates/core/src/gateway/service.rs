use std::sync::Arc;

use async_trait::async_trait;
use cryptotrack_market_data::{
    ChartPoint, FallbackGenerator, MarketAsset, MarketDataError, UpstreamClient, UpstreamOutcome,
};
use log::{debug, info, warn};

use super::model::{DataSource, Endpoint, GatewayConfig, Served, UpstreamFailure};
use super::traits::GatewayServiceTrait;
use crate::cache::CacheStore;
use crate::errors::{Error, Result};

const COIN_ID_REQUIRED: &str = "Coin ID is required";

/// Gateway service - cached, coalesced and never-failing reads of market data.
pub struct GatewayService {
    upstream: Arc<UpstreamClient>,
    fallback: FallbackGenerator,
    config: GatewayConfig,
    markets: CacheStore<Served<MarketAsset>, UpstreamFailure>,
    charts: CacheStore<Served<ChartPoint>, UpstreamFailure>,
}

impl GatewayService {
    /// Creates a gateway whose synthetic data is seeded from the config, or
    /// randomly when no seed is configured.
    pub fn new(upstream: UpstreamClient, config: GatewayConfig) -> Self {
        let seed = config.fallback_seed.unwrap_or_else(rand::random);
        Self::with_fallback(upstream, FallbackGenerator::new(seed), config)
    }

    pub fn with_fallback(
        upstream: UpstreamClient,
        fallback: FallbackGenerator,
        config: GatewayConfig,
    ) -> Self {
        info!(
            "Gateway backed by {} (markets TTL {:?}, chart TTL {:?}, fallback TTL {:?}, stale grace {:?})",
            upstream.provider_id(),
            config.markets_ttl,
            config.chart_ttl,
            config.fallback_ttl,
            config.stale_grace
        );
        Self {
            upstream: Arc::new(upstream),
            fallback,
            markets: CacheStore::new(config.stale_grace),
            charts: CacheStore::new(config.stale_grace),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Answer after a failed population: the latest payload still within the
    /// grace window, otherwise freshly synthesised data.
    fn degrade<T>(
        &self,
        cache: &CacheStore<Served<T>, UpstreamFailure>,
        key: &str,
        failure: &UpstreamFailure,
        synthesise: impl FnOnce() -> Vec<T>,
    ) -> Served<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        match failure {
            UpstreamFailure::NotFound => info!("'{}' is not known upstream", key),
            UpstreamFailure::Transient(err) => warn!("Upstream failed for '{}': {}", key, err),
        }

        // A flight that started after ours may already have refreshed the key
        if let Some(current) = cache.get(key) {
            return current;
        }

        if let Some(previous) = cache.get_stale(key) {
            return match previous.source {
                DataSource::Upstream => {
                    info!("Serving stale '{}'", key);
                    previous.into_stale()
                }
                DataSource::Stale | DataSource::Fallback => previous,
            };
        }

        let served = Served::fallback(synthesise());
        if self.config.fallback_ttl.is_zero() {
            info!("Serving synthetic '{}' ({} items)", key, served.len());
            return served;
        }
        let served = cache.put_if_vacant(key, served, self.config.fallback_ttl);
        info!("Serving {} '{}' ({} items)", served.source, key, served.len());
        served
    }
}

fn into_result<T>(outcome: UpstreamOutcome<T>) -> std::result::Result<T, UpstreamFailure> {
    match outcome {
        UpstreamOutcome::Success(payload) => Ok(payload),
        UpstreamOutcome::NotFound => Err(UpstreamFailure::NotFound),
        UpstreamOutcome::TransientFailure(err) => Err(UpstreamFailure::Transient(Arc::new(err))),
    }
}

/// An empty upstream answer is an integrity fault, never a valid payload.
fn non_empty<T>(items: Vec<T>, what: &str) -> std::result::Result<Vec<T>, UpstreamFailure> {
    if items.is_empty() {
        return Err(UpstreamFailure::Transient(Arc::new(
            MarketDataError::ValidationFailed {
                message: format!("{} is empty", what),
            },
        )));
    }
    Ok(items)
}

#[async_trait]
impl GatewayServiceTrait for GatewayService {
    async fn market_listing(&self, limit: Option<u32>) -> Served<MarketAsset> {
        let limit = self.config.resolve_limit(limit);
        let key = format!("markets:{}", limit);

        let upstream = Arc::clone(&self.upstream);
        let fetched = self
            .markets
            .get_or_fetch(&key, self.config.markets_ttl, move || async move {
                let assets = into_result(upstream.fetch_markets(limit).await)?;
                non_empty(assets, "market listing").map(Served::upstream)
            })
            .await;

        match fetched {
            Ok(served) => served,
            Err(failure) => {
                self.degrade(&self.markets, &key, &failure, || self.fallback.markets(limit))
            }
        }
    }

    async fn chart_series(&self, coin_id: &str) -> Result<Served<ChartPoint>> {
        let coin_id = coin_id.trim();
        if coin_id.is_empty() {
            debug!("Rejecting chart request without a coin id");
            return Err(Error::ClientInput(COIN_ID_REQUIRED.to_string()));
        }

        let days = self.config.chart_days;
        let key = format!("chart:{}:{}", coin_id, days);

        let upstream = Arc::clone(&self.upstream);
        let owned_id = coin_id.to_string();
        let fetched = self
            .charts
            .get_or_fetch(&key, self.config.chart_ttl, move || async move {
                let points = into_result(upstream.fetch_chart(&owned_id, days).await)?;
                non_empty(points, "price series").map(Served::upstream)
            })
            .await;

        Ok(match fetched {
            Ok(served) => served,
            Err(failure) => self.degrade(&self.charts, &key, &failure, || {
                self.fallback.chart(coin_id, days)
            }),
        })
    }

    fn cache_control(&self, endpoint: Endpoint, source: DataSource) -> String {
        let max_age = match source {
            DataSource::Upstream => self.config.ttl_for(endpoint),
            DataSource::Stale | DataSource::Fallback => self.config.fallback_ttl,
        }
        .as_secs();
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            max_age,
            max_age / 2
        )
    }

    fn sweep_caches(&self) -> usize {
        let removed = self.markets.sweep() + self.charts.sweep();
        debug!(
            "Cache sweep removed {} entries ({} listings, {} charts remain)",
            removed,
            self.markets.len(),
            self.charts.len()
        );
        removed
    }
}
