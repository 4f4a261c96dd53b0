//! Upstream failure taxonomy.
//!
//! Every way a provider call can go wrong maps onto one [`MarketDataError`]
//! variant, and every variant onto a [`RetryClass`]. The upstream client
//! only ever looks at the class; the variant is kept for logs.

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Explicit 404 for a coin identifier.
    #[error("Coin not found: {0}")]
    CoinNotFound(String),

    /// HTTP 429.
    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    /// No complete response within the client timeout.
    #[error("Request to {provider} timed out")]
    Timeout { provider: String },

    /// Non-2xx status other than 404/429, or a body that is not the expected JSON.
    #[error("{provider} request failed: {message}")]
    ProviderError { provider: String, message: String },

    /// Well-formed JSON that breaks the record contract (missing fields,
    /// oversized listing, empty series).
    #[error("Upstream payload rejected: {message}")]
    ValidationFailed { message: String },

    /// Connection-level failure below HTTP.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// How the upstream client should react to this error.
    ///
    /// ```
    /// use cryptotrack_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let slow = MarketDataError::Timeout { provider: "COINGECKO".to_string() };
    /// assert_eq!(slow.retry_class(), RetryClass::WithBackoff);
    ///
    /// let unknown = MarketDataError::CoinNotFound("not-a-coin".to_string());
    /// assert_eq!(unknown.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Same request, same answer
            Self::CoinNotFound(_) | Self::ValidationFailed { .. } => RetryClass::Never,
            Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::ProviderError { .. }
            | Self::Network(_) => RetryClass::WithBackoff,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CoinNotFound(_))
    }

    /// Splits reqwest transport errors into timeouts and everything else.
    pub fn from_transport(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else {
            Self::Network(err)
        }
    }
}
