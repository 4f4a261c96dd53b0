//! In-process response cache.
//!
//! - **Entry** (`entry.rs`) - A stored payload with its freshness window
//! - **Store** (`store.rs`) - Keyed TTL store with single-flight population
//!
//! The store is generic over the payload and the fetch error so the gateway
//! can keep listings and chart series in separately typed instances.

mod entry;
mod store;

pub use entry::CacheEntry;
pub use store::CacheStore;
