use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, warn};
use tokio::time::Instant;

use super::entry::CacheEntry;

type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct InFlight<V, E> {
    id: u64,
    fetch: SharedFetch<V, E>,
}

struct CacheState<V, E> {
    entries: HashMap<String, CacheEntry<V>>,
    in_flight: HashMap<String, InFlight<V, E>>,
    next_flight_id: u64,
}

impl<V, E> CacheState<V, E> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            in_flight: HashMap::new(),
            next_flight_id: 0,
        }
    }
}

/// Lock the cache state, recovering from poison.
///
/// A panic while the lock was held can at worst leave a half-updated map of
/// cloneable payloads, which is still consistent enough to serve from.
fn lock_state<V, E>(state: &Mutex<CacheState<V, E>>) -> MutexGuard<'_, CacheState<V, E>> {
    state.lock().unwrap_or_else(|poisoned| {
        warn!("Cache state mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Clears the in-flight marker of a fetch when its future finishes or unwinds.
struct FlightGuard<V, E> {
    state: Arc<Mutex<CacheState<V, E>>>,
    key: String,
    id: u64,
}

impl<V, E> Drop for FlightGuard<V, E> {
    fn drop(&mut self) {
        let mut state = lock_state(&self.state);
        if state
            .in_flight
            .get(&self.key)
            .is_some_and(|flight| flight.id == self.id)
        {
            state.in_flight.remove(&self.key);
        }
    }
}

/// Keyed TTL cache with single-flight population.
///
/// For any key at most one fetch runs at a time. Callers arriving while it is
/// pending await the same shared future and observe the same result. The
/// fetch is driven by its own task, so it runs to completion and fills the
/// cache even when every caller has gone away. Only successful results are
/// stored; failures go to every waiter and nothing is cached.
///
/// Expired entries are kept for `stale_grace` so that [`get_stale`] can
/// serve them when the upstream is down. [`sweep`] drops entries past that
/// window.
///
/// [`get_stale`]: CacheStore::get_stale
/// [`sweep`]: CacheStore::sweep
pub struct CacheStore<V, E> {
    state: Arc<Mutex<CacheState<V, E>>>,
    stale_grace: Duration,
}

impl<V, E> Clone for CacheStore<V, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            stale_grace: self.stale_grace,
        }
    }
}

impl<V, E> CacheStore<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(stale_grace: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::new())),
            stale_grace,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V, E>> {
        lock_state(&self.state)
    }

    /// Fresh payload for `key`, if any.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.lock()
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.payload.clone())
    }

    /// Latest payload for `key` that has not outlived the grace window.
    ///
    /// Used only after an upstream failure; may return an expired payload.
    pub fn get_stale(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.lock()
            .entries
            .get(key)
            .filter(|entry| entry.is_within_grace(now, self.stale_grace))
            .map(|entry| entry.payload.clone())
    }

    /// Stores `payload` under `key`, replacing any previous entry.
    pub fn put(&self, key: &str, payload: V, ttl: Duration) {
        self.lock()
            .entries
            .insert(key.to_string(), CacheEntry::new(payload, ttl));
    }

    /// Stores `payload` unless a fresh entry already exists, and returns the
    /// payload now held under `key`.
    pub fn put_if_vacant(&self, key: &str, payload: V, ttl: Duration) -> V {
        let now = Instant::now();
        let mut state = self.lock();
        if let Some(entry) = state.entries.get(key) {
            if entry.is_fresh(now) {
                return entry.payload.clone();
            }
        }
        state
            .entries
            .insert(key.to_string(), CacheEntry::new(payload.clone(), ttl));
        payload
    }

    /// Returns the fresh payload for `key`, or populates it with `fetch`.
    ///
    /// `fetch` is invoked while the store lock is held; it must only build
    /// the future and leave all work to it. Must be called within a tokio
    /// runtime.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let flight = {
            let mut state = self.lock();
            let now = Instant::now();

            if let Some(entry) = state.entries.get(key) {
                if entry.is_fresh(now) {
                    debug!("Cache hit for '{}' (age {:?})", key, entry.age(now));
                    return Ok(entry.payload.clone());
                }
            }

            let pending = state.in_flight.get(key).map(|flight| flight.fetch.clone());
            match pending {
                Some(existing) => {
                    debug!("Joining in-flight fetch for '{}'", key);
                    existing
                }
                None => {
                    debug!("Cache miss for '{}', fetching", key);
                    let id = state.next_flight_id;
                    state.next_flight_id = state.next_flight_id.wrapping_add(1);

                    let flight = self.start_flight(key, id, ttl, fetch());
                    state.in_flight.insert(
                        key.to_string(),
                        InFlight {
                            id,
                            fetch: flight.clone(),
                        },
                    );
                    tokio::spawn(flight.clone().map(drop));
                    flight
                }
            }
        };

        flight.await
    }

    fn start_flight<Fut>(&self, key: &str, id: u64, ttl: Duration, fetch: Fut) -> SharedFetch<V, E>
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let guard = FlightGuard {
            state: Arc::clone(&self.state),
            key: key.to_string(),
            id,
        };

        async move {
            let result = fetch.await;
            if let Ok(payload) = &result {
                lock_state(&guard.state).entries.insert(
                    guard.key.clone(),
                    CacheEntry::new(payload.clone(), ttl),
                );
            }
            drop(guard);
            result
        }
        .boxed()
        .shared()
    }

    /// Drops entries that are past their TTL and the grace window.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let grace = self.stale_grace;
        let mut state = self.lock();
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| entry.is_within_grace(now, grace));
        before - state.entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys with a fetch currently pending.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }
}
