use std::sync::Arc;

use cryptotrack_core::gateway::{GatewayService, GatewayServiceTrait};
use cryptotrack_market_data::{CoinGeckoProvider, MarketDataProvider, UpstreamClient};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub gateway: Arc<dyn GatewayServiceTrait>,
}

pub fn init_tracing() {
    let log_format = std::env::var("CT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Wires the gateway against the configured CoinGecko endpoint.
pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    tracing::info!("Upstream base URL: {}", config.upstream.base_url);
    if config.upstream.api_key.is_some() {
        tracing::info!("Upstream API key configured");
    }
    let provider = Arc::new(CoinGeckoProvider::new(config.upstream.clone()));
    build_state_with_provider(config, provider)
}

/// Wires the gateway against any provider, e.g. a stub in tests.
pub fn build_state_with_provider(
    config: &Config,
    provider: Arc<dyn MarketDataProvider>,
) -> anyhow::Result<Arc<AppState>> {
    config.gateway.validate()?;
    let upstream = UpstreamClient::new(provider);
    let gateway: Arc<dyn GatewayServiceTrait> =
        Arc::new(GatewayService::new(upstream, config.gateway.clone()));
    Ok(Arc::new(AppState { gateway }))
}
