//! Route match cache module
//!
//! Bounded map from the full literal request URL to its resolved route
//! match, so repeated URLs skip the pattern scan. Eviction is
//! insertion-order FIFO, not true LRU: hits do not refresh an entry's
//! position. That trades recency accuracy for O(1) eviction and is a
//! documented simplification, not a bug. A "not found" resolution is
//! memoized as an explicit sentinel distinct from "never looked up", but
//! only while the cache has free room: misses never evict live matches.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// The outcome of resolving a URL, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMatch {
    /// Index into the route table.
    pub route_index: usize,
    /// Path parameters computed for this URL.
    pub params: HashMap<String, String>,
    /// Query parameters computed for this URL.
    pub query: HashMap<String, String>,
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// URL previously resolved to a route.
    Hit(CachedMatch),
    /// URL previously resolved to nothing (memoized 404).
    NotFound,
    /// URL never resolved.
    Absent,
}

/// Counter snapshot for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
}

struct Inner {
    entries: HashMap<String, Option<CachedMatch>>,
    order: VecDeque<String>,
}

/// Bounded URL-match cache shared across request tasks.
pub struct RouteCache {
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    inner: Mutex<Inner>,
}

impl RouteCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Look up a URL. Both a memoized match and a memoized miss count as
    /// cache hits.
    pub fn lookup(&self, url: &str) -> Lookup {
        let inner = self.inner.lock().expect("route cache lock poisoned");
        match inner.entries.get(url) {
            Some(Some(found)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Lookup::Hit(found.clone())
            }
            Some(None) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Lookup::NotFound
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Lookup::Absent
            }
        }
    }

    /// Record a resolved match, evicting the earliest-inserted entry when
    /// at capacity.
    pub fn insert_match(&self, url: String, found: CachedMatch) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock().expect("route cache lock poisoned");
        if inner.entries.contains_key(&url) {
            // Raced duplicate resolution: overwrite in place, keep the
            // original insertion position.
            inner.entries.insert(url, Some(found));
            return;
        }
        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }
        inner.order.push_back(url.clone());
        inner.entries.insert(url, Some(found));
    }

    /// Memoize a "not found" resolution. Inserted only while below
    /// capacity; a miss is never worth evicting a live entry for.
    pub fn insert_miss(&self, url: String) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock().expect("route cache lock poisoned");
        if inner.entries.contains_key(&url) || inner.entries.len() >= self.capacity {
            return;
        }
        inner.order.push_back(url.clone());
        inner.entries.insert(url, None);
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("route cache lock poisoned")
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            len: self.len(),
        }
    }
}
