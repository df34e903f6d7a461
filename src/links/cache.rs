//! Bounded TTL cache for sanitized recipe links.
//!
//! One entry per (url, normalized title) pair; expired entries are dropped
//! on read, capacity overflow evicts the least-recently-used pair.

use crate::text::normalize_label;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
pub const CACHE_CAPACITY: usize = 200;

struct Entry {
    value: String,
    stored_at: Instant,
}

pub struct LinkCache {
    ttl: Duration,
    store: Mutex<LruCache<(String, String), Entry>>,
}

impl LinkCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(CACHE_CAPACITY).expect("nonzero"));
        Self {
            ttl,
            store: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn key(url: &str, title: &str) -> (String, String) {
        (url.to_string(), normalize_label(title))
    }

    pub fn get(&self, url: &str, title: &str) -> Option<String> {
        let key = Self::key(url, title);
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        match store.get(&key) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                store.pop(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, url: &str, title: &str, value: String) {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        store.put(
            Self::key(url, title),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }
}

impl Default for LinkCache {
    fn default() -> Self {
        Self::new(CACHE_CAPACITY, CACHE_TTL)
    }
}
