//! Cache backend: trait and the local DashMap implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::clock::{Clock, SystemClock};

/// A cached entry with TTL support.
///
/// The data is wrapped in `Arc` so hits hand out a cheap clone.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub expires_at: Instant,
}

impl CachedEntry {
    pub fn new(data: Vec<u8>, now: Instant, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            expires_at: now + ttl,
        }
    }

    /// Check if this entry has expired at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Key/value store with per-entry expiry.
///
/// Implementations never fail; a backend problem is reported as a miss.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration);

    async fn delete(&self, key: &str);
}

/// Single-process cache over a `DashMap`.
///
/// Expiry is evaluated lazily on read. When `max_entries` is reached, expired
/// entries are purged first, then an arbitrary live entry is evicted.
pub struct LocalCache {
    entries: DashMap<String, CachedEntry>,
    clock: Arc<dyn Clock>,
    max_entries: usize,
}

impl LocalCache {
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            max_entries: max_entries.max(1),
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn make_room(&self, now: Instant) {
        if self.entries.len() < self.max_entries {
            return;
        }

        self.entries.retain(|_, entry| !entry.is_expired(now));

        while self.entries.len() >= self.max_entries {
            let victim = self.entries.iter().next().map(|e| e.key().clone());
            match victim {
                Some(key) => {
                    log::debug!("cache full, evicting {}", key);
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheStore for LocalCache {
    async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            drop(entry);
            self.entries.remove_if(key, |_, e| e.is_expired(now));
            return None;
        }
        Some(Arc::clone(&entry.data))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let now = self.clock.now();
        if !self.entries.contains_key(key) {
            self.make_room(now);
        }
        self.entries
            .insert(key.to_string(), CachedEntry::new(value, now, ttl));
    }

    async fn delete(&self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn cache_with_clock(max_entries: usize) -> (LocalCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (LocalCache::with_clock(max_entries, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let (cache, _) = cache_with_clock(10);
        cache.set("movie:1", b"alien".to_vec(), Duration::from_secs(60)).await;

        assert_eq!(cache.get("movie:1").await.as_deref(), Some(&b"alien".to_vec()));

        cache.delete("movie:1").await;
        assert!(cache.get("movie:1").await.is_none());
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache_with_clock(10);
        cache.set("k", b"v".to_vec(), Duration::from_secs(300)).await;

        clock.advance(Duration::from_secs(299));
        assert!(cache.get("k").await.is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get("k").await.is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_ttl() {
        let (cache, clock) = cache_with_clock(10);
        cache.set("k", b"old".to_vec(), Duration::from_secs(10)).await;
        clock.advance(Duration::from_secs(8));
        cache.set("k", b"new".to_vec(), Duration::from_secs(10)).await;
        clock.advance(Duration::from_secs(8));

        assert_eq!(cache.get("k").await.as_deref(), Some(&b"new".to_vec()));
    }

    #[tokio::test]
    async fn test_capacity_purges_expired_first() {
        let (cache, clock) = cache_with_clock(2);
        cache.set("short", b"1".to_vec(), Duration::from_secs(1)).await;
        cache.set("long", b"2".to_vec(), Duration::from_secs(100)).await;

        clock.advance(Duration::from_secs(5));
        cache.set("new", b"3".to_vec(), Duration::from_secs(100)).await;

        assert_eq!(cache.len(), 2);
        assert!(cache.get("long").await.is_some());
        assert!(cache.get("new").await.is_some());
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let (cache, _) = cache_with_clock(3);
        for i in 0..10 {
            cache
                .set(&format!("k{}", i), vec![i as u8], Duration::from_secs(60))
                .await;
        }

        assert_eq!(cache.len(), 3);
        assert!(cache.get("k9").await.is_some());
    }
}
