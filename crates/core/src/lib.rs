//! CryptoTrack Core - caching and degradation policy of the market-data gateway.
//!
//! This crate sits between the HTTP surface and the upstream provider. It
//! owns the response caches, coalesces concurrent misses into one upstream
//! call, and decides whether a request is answered with live, stale, or
//! synthetic data. It never fails a request because the upstream did.

pub mod cache;
pub mod errors;
pub mod gateway;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
