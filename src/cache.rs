//! Response cache with a wall-clock TTL.
//!
//! Callers pass `now_unix` explicitly, so the clock is injected rather than
//! read internally and tests drive expiry deterministically. Concurrent
//! callers may race into a duplicate fetch; re-fetching is idempotent, so no
//! coordination is applied.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ResponseCache {
    inner: Mutex<HashMap<String, CachedBody>>,
}

#[derive(Debug, Clone)]
struct CachedBody {
    fetched_at: u64,
    body: String,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached body for `key` if it is younger than `ttl_secs`.
    pub fn get(&self, key: &str, now_unix: u64, ttl_secs: u64) -> Option<String> {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        inner
            .get(key)
            .filter(|c| now_unix.saturating_sub(c.fetched_at) <= ttl_secs)
            .map(|c| c.body.clone())
    }

    pub fn put(&self, key: &str, now_unix: u64, body: String) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.insert(
            key.to_string(),
            CachedBody {
                fetched_at: now_unix,
                body,
            },
        );
    }
}
