//! CoinGecko provider implementation.
//!
//! This provider fetches crypto market data from the public CoinGecko v3 API.
//! A demo API key is optional and sent as the `x-cg-demo-api-key` header.
//!
//! # API Endpoints
//!
//! - Listing: `{base}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={limit}&page=1&sparkline=false&price_change_percentage=24h`
//! - History: `{base}/coins/{id}/market_chart?vs_currency=usd&days={days}&interval=daily`
//!
//! # Response Format
//!
//! The listing is a JSON array of coin rows. The history endpoint returns
//! `{"prices": [[ms, price], ...], "market_caps": ..., "total_volumes": ...}`.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};

use crate::errors::MarketDataError;
use crate::models::{sort_by_timestamp, ChartPoint, MarketAsset};
use crate::provider::MarketDataProvider;

use models::{CoinMarketRow, MarketChartResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "COINGECKO";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";
const VS_CURRENCY: &str = "usd";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Connection settings for [`CoinGeckoProvider`].
#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    /// API root without trailing slash
    pub base_url: String,
    pub api_key: Option<String>,
    /// Bound on a single HTTP exchange, connect to last body byte
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// CoinGecko provider for fetching crypto listings and price history.
///
/// # Example
///
/// ```ignore
/// let provider = CoinGeckoProvider::new(CoinGeckoConfig::default());
/// let top = provider.get_markets(10).await?;
/// ```
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(config: CoinGeckoConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    fn provider_error(message: impl Into<String>) -> MarketDataError {
        MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: message.into(),
        }
    }

    /// Issues a GET and returns the body of a 2xx response.
    ///
    /// `not_found` is returned verbatim for a 404 so each endpoint decides what
    /// an unknown resource means.
    async fn fetch(
        &self,
        url: &str,
        query: &[(&str, String)],
        not_found: impl FnOnce() -> MarketDataError,
    ) -> Result<String, MarketDataError> {
        let mut request = self
            .client
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        debug!("{} GET {}", PROVIDER_ID, url);
        let response = request
            .send()
            .await
            .map_err(|e| MarketDataError::from_transport(PROVIDER_ID, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("{} rate limited the request to {}", PROVIDER_ID, url);
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        if !status.is_success() {
            return Err(Self::provider_error(format!("HTTP error: {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::from_transport(PROVIDER_ID, e))
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_markets(&self, limit: u32) -> Result<Vec<MarketAsset>, MarketDataError> {
        let url = format!("{}/coins/markets", self.base_url);
        let query = [
            ("vs_currency", VS_CURRENCY.to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", limit.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];

        let body = self
            .fetch(&url, &query, || {
                Self::provider_error("markets endpoint returned 404")
            })
            .await?;
        let rows: Vec<CoinMarketRow> = serde_json::from_str(&body)
            .map_err(|e| Self::provider_error(format!("Failed to parse response: {}", e)))?;

        if rows.len() > limit as usize {
            return Err(MarketDataError::ValidationFailed {
                message: format!("asked for {} assets, got {}", limit, rows.len()),
            });
        }

        rows.into_iter()
            .enumerate()
            .map(|(i, row)| row.into_asset(i))
            .collect()
    }

    async fn get_market_chart(
        &self,
        coin_id: &str,
        days: u32,
    ) -> Result<Vec<ChartPoint>, MarketDataError> {
        let url = format!(
            "{}/coins/{}/market_chart",
            self.base_url,
            urlencoding::encode(coin_id)
        );
        let query = [
            ("vs_currency", VS_CURRENCY.to_string()),
            ("days", days.to_string()),
            ("interval", "daily".to_string()),
        ];

        let body = self
            .fetch(&url, &query, || {
                MarketDataError::CoinNotFound(coin_id.to_string())
            })
            .await?;
        let chart: MarketChartResponse = serde_json::from_str(&body)
            .map_err(|e| Self::provider_error(format!("Failed to parse response: {}", e)))?;

        let mut points = chart.into_points()?;
        sort_by_timestamp(&mut points);
        Ok(points)
    }
}
