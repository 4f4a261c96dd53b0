use std::time::Duration;

use tokio::time::Instant;

/// A cached payload and the moment it was stored.
///
/// Timestamps come from `tokio::time`, so tests can drive expiry with a
/// paused clock.
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub payload: V,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(payload: V, ttl: Duration) -> Self {
        Self {
            payload,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// Fresh while `now <= stored_at + ttl`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now <= self.stored_at + self.ttl
    }

    /// Still servable after an upstream failure: expired less than `grace` ago.
    pub fn is_within_grace(&self, now: Instant, grace: Duration) -> bool {
        now <= self.stored_at + self.ttl + grace
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }
}
