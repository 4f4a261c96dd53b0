//! Tests for the GatewayService decision table.
//!
//! The upstream is a mock provider with a switchable behaviour and call
//! counters. Time is paused so TTL and grace windows are driven with
//! `tokio::time::advance`.

#[cfg(test)]
mod tests {
    use crate::errors::Error;
    use crate::gateway::{
        DataSource, Endpoint, GatewayConfig, GatewayService, GatewayServiceTrait,
    };
    use async_trait::async_trait;
    use cryptotrack_market_data::{
        ChartPoint, FallbackGenerator, MarketAsset, MarketDataError, MarketDataProvider,
        RetryPolicy, UpstreamClient,
    };
    use futures::future::join_all;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const DAY_MS: i64 = 86_400_000;

    // =========================================================================
    // Mock provider
    // =========================================================================

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Behaviour {
        Healthy,
        Failing,
        NotFound,
        Empty,
    }

    struct MockProvider {
        behaviour: Mutex<Behaviour>,
        latency: Duration,
        market_calls: AtomicUsize,
        chart_calls: AtomicUsize,
        last_limit: AtomicU32,
    }

    impl MockProvider {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Self::with_latency(behaviour, Duration::from_millis(20))
        }

        fn with_latency(behaviour: Behaviour, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                behaviour: Mutex::new(behaviour),
                latency,
                market_calls: AtomicUsize::new(0),
                chart_calls: AtomicUsize::new(0),
                last_limit: AtomicU32::new(0),
            })
        }

        fn set_behaviour(&self, behaviour: Behaviour) {
            *self.behaviour.lock().unwrap() = behaviour;
        }

        fn behaviour(&self) -> Behaviour {
            *self.behaviour.lock().unwrap()
        }

        fn market_calls(&self) -> usize {
            self.market_calls.load(Ordering::SeqCst)
        }

        fn chart_calls(&self) -> usize {
            self.chart_calls.load(Ordering::SeqCst)
        }

        fn last_limit(&self) -> u32 {
            self.last_limit.load(Ordering::SeqCst)
        }
    }

    fn asset(rank: u32) -> MarketAsset {
        MarketAsset {
            id: format!("coin-{}", rank),
            symbol: format!("c{}", rank),
            name: format!("Coin {}", rank),
            image: format!("https://example.com/{}.png", rank),
            current_price: dec!(10.5),
            market_cap: Decimal::from(1_000_000 - rank),
            total_volume: dec!(5000),
            price_change_percentage_24h: dec!(-1.2),
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            "MOCK"
        }

        async fn get_markets(&self, limit: u32) -> Result<Vec<MarketAsset>, MarketDataError> {
            self.market_calls.fetch_add(1, Ordering::SeqCst);
            self.last_limit.store(limit, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;

            match self.behaviour() {
                Behaviour::Healthy => Ok((1..=limit).map(asset).collect()),
                Behaviour::Failing => Err(MarketDataError::ProviderError {
                    provider: "MOCK".to_string(),
                    message: "HTTP error: 503 Service Unavailable".to_string(),
                }),
                Behaviour::NotFound => Err(MarketDataError::CoinNotFound("markets".to_string())),
                Behaviour::Empty => Ok(Vec::new()),
            }
        }

        async fn get_market_chart(
            &self,
            coin_id: &str,
            days: u32,
        ) -> Result<Vec<ChartPoint>, MarketDataError> {
            self.chart_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;

            match self.behaviour() {
                Behaviour::Healthy => Ok((0..=i64::from(days))
                    .map(|day| {
                        ChartPoint::new(1_700_000_000_000 + day * DAY_MS, dec!(100) + Decimal::from(day))
                    })
                    .collect()),
                Behaviour::Failing => Err(MarketDataError::Timeout {
                    provider: "MOCK".to_string(),
                }),
                Behaviour::NotFound => Err(MarketDataError::CoinNotFound(coin_id.to_string())),
                Behaviour::Empty => Ok(Vec::new()),
            }
        }
    }

    fn service_with_config(provider: Arc<MockProvider>, config: GatewayConfig) -> GatewayService {
        let upstream = UpstreamClient::with_retry_policy(provider, RetryPolicy::no_retry());
        GatewayService::with_fallback(upstream, FallbackGenerator::new(7), config)
    }

    fn service(provider: Arc<MockProvider>) -> GatewayService {
        service_with_config(provider, GatewayConfig::default())
    }

    // =========================================================================
    // Market listing
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_listing_is_served_from_cache_within_ttl() {
        let provider = MockProvider::new(Behaviour::Healthy);
        let gateway = service(provider.clone());

        let first = gateway.market_listing(Some(10)).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        let second = gateway.market_listing(Some(10)).await;

        assert_eq!(first.source, DataSource::Upstream);
        assert_eq!(first.len(), 10);
        assert!(Arc::ptr_eq(&first.items, &second.items));
        assert_eq!(provider.market_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_is_refetched_after_ttl() {
        let provider = MockProvider::new(Behaviour::Healthy);
        let gateway = service(provider.clone());

        gateway.market_listing(Some(10)).await;
        tokio::time::advance(Duration::from_secs(61)).await;
        let refreshed = gateway.market_listing(Some(10)).await;

        assert_eq!(refreshed.source, DataSource::Upstream);
        assert_eq!(provider.market_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_limit_is_resolved_before_fetch() {
        let provider = MockProvider::new(Behaviour::Healthy);
        let gateway = service(provider.clone());

        let clamped = gateway.market_listing(Some(1000)).await;
        assert_eq!(provider.last_limit(), 250);
        assert_eq!(clamped.len(), 250);

        let defaulted = gateway.market_listing(None).await;
        assert_eq!(provider.last_limit(), 50);
        assert_eq!(defaulted.len(), 50);

        // Zero resolves to the same key as no limit at all
        gateway.market_listing(Some(0)).await;
        assert_eq!(provider.market_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_limits_use_distinct_entries() {
        let provider = MockProvider::new(Behaviour::Healthy);
        let gateway = service(provider.clone());

        let ten = gateway.market_listing(Some(10)).await;
        let twenty = gateway.market_listing(Some(20)).await;

        assert_eq!(ten.len(), 10);
        assert_eq!(twenty.len(), 20);
        assert_eq!(provider.market_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_falls_back_when_upstream_fails() {
        let provider = MockProvider::new(Behaviour::Failing);
        let gateway = service(provider.clone());

        let served = gateway.market_listing(Some(20)).await;

        assert_eq!(served.source, DataSource::Fallback);
        assert_eq!(served.len(), 20);
        assert_eq!(served.items[0].id, "bitcoin");
        assert_eq!(served.items[9].id, "polygon");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_listing_is_treated_as_failure() {
        let provider = MockProvider::new(Behaviour::Empty);
        let gateway = service(provider.clone());

        let served = gateway.market_listing(None).await;

        assert_eq!(served.source, DataSource::Fallback);
        assert_eq!(served.len(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_is_cached_for_fallback_ttl() {
        let provider = MockProvider::new(Behaviour::Failing);
        let gateway = service(provider.clone());

        let first = gateway.market_listing(Some(10)).await;
        let second = gateway.market_listing(Some(10)).await;
        assert_eq!(provider.market_calls(), 1);
        assert!(Arc::ptr_eq(&first.items, &second.items));

        tokio::time::advance(Duration::from_secs(16)).await;
        let third = gateway.market_listing(Some(10)).await;
        assert_eq!(provider.market_calls(), 2);
        assert_eq!(third.source, DataSource::Fallback);
        assert_eq!(first.items, third.items);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_fallback_ttl_disables_fallback_caching() {
        let provider = MockProvider::new(Behaviour::Failing);
        let config = GatewayConfig {
            fallback_ttl: Duration::ZERO,
            ..Default::default()
        };
        let gateway = service_with_config(provider.clone(), config);

        let first = gateway.market_listing(Some(10)).await;
        let second = gateway.market_listing(Some(10)).await;

        assert_eq!(provider.market_calls(), 2);
        assert_eq!(first.items, second.items);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_listing_served_when_refresh_fails() {
        let provider = MockProvider::new(Behaviour::Healthy);
        let gateway = service(provider.clone());

        let live = gateway.market_listing(Some(10)).await;
        tokio::time::advance(Duration::from_secs(61)).await;
        provider.set_behaviour(Behaviour::Failing);

        let stale = gateway.market_listing(Some(10)).await;
        assert_eq!(stale.source, DataSource::Stale);
        assert!(Arc::ptr_eq(&live.items, &stale.items));

        // Stale data is not re-cached, so the next request retries upstream
        gateway.market_listing(Some(10)).await;
        assert_eq!(provider.market_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_listing_expires_after_grace() {
        let provider = MockProvider::new(Behaviour::Healthy);
        let gateway = service(provider.clone());

        gateway.market_listing(Some(10)).await;
        tokio::time::advance(Duration::from_secs(60 + 300 + 1)).await;
        provider.set_behaviour(Behaviour::Failing);

        let served = gateway.market_listing(Some(10)).await;
        assert_eq!(served.source, DataSource::Fallback);
        assert_eq!(served.items[0].id, "bitcoin");
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_once_upstream_is_back() {
        let provider = MockProvider::new(Behaviour::Failing);
        let gateway = service(provider.clone());

        let degraded = gateway.market_listing(Some(10)).await;
        assert_eq!(degraded.source, DataSource::Fallback);

        provider.set_behaviour(Behaviour::Healthy);
        tokio::time::advance(Duration::from_secs(16)).await;

        let recovered = gateway.market_listing(Some(10)).await;
        assert_eq!(recovered.source, DataSource::Upstream);
        assert_eq!(recovered.items[0].id, "coin-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_listing_requests_share_one_fetch() {
        let provider = MockProvider::with_latency(Behaviour::Healthy, Duration::from_millis(300));
        let gateway = service(provider.clone());

        let results = join_all((0..10).map(|_| gateway.market_listing(Some(50)))).await;

        assert_eq!(provider.market_calls(), 1);
        for served in &results {
            assert_eq!(served.source, DataSource::Upstream);
            assert!(Arc::ptr_eq(&results[0].items, &served.items));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_during_outage_share_one_attempt() {
        let provider = MockProvider::with_latency(Behaviour::Failing, Duration::from_millis(300));
        let gateway = service(provider.clone());

        let results = join_all((0..10).map(|_| gateway.market_listing(Some(20)))).await;

        assert_eq!(provider.market_calls(), 1);
        for served in &results {
            assert_eq!(served.source, DataSource::Fallback);
            assert_eq!(results[0].items, served.items);
        }
    }

    // =========================================================================
    // Chart series
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_blank_coin_id_is_rejected_before_upstream() {
        let provider = MockProvider::new(Behaviour::Healthy);
        let gateway = service(provider.clone());

        for coin_id in ["", "   "] {
            let err = gateway.chart_series(coin_id).await.unwrap_err();
            assert_eq!(err, Error::ClientInput("Coin ID is required".to_string()));
        }
        assert_eq!(provider.chart_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chart_is_cached_per_coin() {
        let provider = MockProvider::new(Behaviour::Healthy);
        let gateway = service(provider.clone());

        let bitcoin = gateway.chart_series("bitcoin").await.unwrap();
        gateway.chart_series("bitcoin").await.unwrap();
        gateway.chart_series("ethereum").await.unwrap();

        assert_eq!(bitcoin.source, DataSource::Upstream);
        assert_eq!(bitcoin.len(), 8);
        assert_eq!(provider.chart_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_coin_gets_synthetic_series() {
        let provider = MockProvider::new(Behaviour::NotFound);
        let gateway = service(provider.clone());

        let served = gateway.chart_series("invalid-coin-id-12345").await.unwrap();

        assert_eq!(served.source, DataSource::Fallback);
        assert_eq!(served.len(), 8);
        for pair in served.items.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        assert!(served.items.iter().all(|p| p.price > Decimal::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_series_is_treated_as_failure() {
        let provider = MockProvider::new(Behaviour::Empty);
        let gateway = service(provider.clone());

        let served = gateway.chart_series("solana").await.unwrap();

        assert_eq!(served.source, DataSource::Fallback);
        assert!(!served.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_chart_served_when_refresh_fails() {
        let provider = MockProvider::new(Behaviour::Healthy);
        let gateway = service(provider.clone());

        let live = gateway.chart_series("bitcoin").await.unwrap();
        tokio::time::advance(Duration::from_secs(90)).await;
        provider.set_behaviour(Behaviour::Failing);

        let stale = gateway.chart_series("bitcoin").await.unwrap();
        assert_eq!(stale.source, DataSource::Stale);
        assert_eq!(live.items, stale.items);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_chart_requests_share_one_fetch() {
        let provider = MockProvider::with_latency(Behaviour::Healthy, Duration::from_millis(300));
        let gateway = service(provider.clone());

        let results = join_all((0..8).map(|_| gateway.chart_series("ethereum"))).await;

        assert_eq!(provider.chart_calls(), 1);
        let first = results[0].as_ref().unwrap();
        for served in &results {
            assert!(Arc::ptr_eq(&first.items, &served.as_ref().unwrap().items));
        }
    }

    // =========================================================================
    // Housekeeping
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_cache_control_follows_ttls() {
        let config = GatewayConfig {
            chart_ttl: Duration::from_secs(120),
            ..Default::default()
        };
        let gateway = service_with_config(MockProvider::new(Behaviour::Healthy), config);

        assert_eq!(
            gateway.cache_control(Endpoint::Markets, DataSource::Upstream),
            "public, s-maxage=60, stale-while-revalidate=30"
        );
        assert_eq!(
            gateway.cache_control(Endpoint::Chart, DataSource::Upstream),
            "public, s-maxage=120, stale-while-revalidate=60"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_payloads_advertise_fallback_ttl() {
        let gateway = service(MockProvider::new(Behaviour::Healthy));

        for source in [DataSource::Fallback, DataSource::Stale] {
            for endpoint in [Endpoint::Markets, Endpoint::Chart] {
                assert_eq!(
                    gateway.cache_control(endpoint, source),
                    "public, s-maxage=15, stale-while-revalidate=7"
                );
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_entries_past_grace() {
        let provider = MockProvider::new(Behaviour::Healthy);
        let gateway = service(provider.clone());

        gateway.market_listing(Some(10)).await;
        gateway.chart_series("bitcoin").await.unwrap();
        assert_eq!(gateway.sweep_caches(), 0);

        tokio::time::advance(Duration::from_secs(60 + 300 + 1)).await;
        assert_eq!(gateway.sweep_caches(), 2);
    }
}
