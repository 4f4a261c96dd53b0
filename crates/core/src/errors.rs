//! Core error types for the gateway.
//!
//! Upstream failures never surface here: the gateway always degrades to
//! stale or synthetic data. What remains are faults the caller or the
//! operator has to fix.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request itself is unusable, e.g. a blank coin identifier.
    #[error("{0}")]
    ClientInput(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),
}

impl Error {
    pub fn is_client_input(&self) -> bool {
        matches!(self, Self::ClientInput(_))
    }
}
