//! Gateway module - cached reads with stale and synthetic degradation.
//!
//! Every read goes through the same decision table:
//!
//! ```text
//! fresh cache entry?          -> serve it
//! upstream answers            -> cache for the endpoint TTL, serve
//! upstream fails, stale entry -> serve the stale payload, leave it as is
//! upstream fails, nothing     -> synthesise, cache for the fallback TTL, serve
//! ```
//!
//! Concurrent misses on one key share a single upstream call through
//! [`CacheStore`](crate::cache::CacheStore).

mod model;
mod service;
mod traits;

#[cfg(test)]
mod service_tests;

pub use model::{DataSource, Endpoint, GatewayConfig, Served, UpstreamFailure};
pub use service::GatewayService;
pub use traits::GatewayServiceTrait;
