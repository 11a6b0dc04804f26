//! Shared in-memory cache: concurrent lookups under a read lock, writers
//! exclusive, LFU-with-aging eviction at a size cap.

use crate::Fingerprint;
use ahash::AHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 256;

struct Entry<V> {
    value: Arc<V>,
    accesses: AtomicU64,
    created: Instant,
}

impl<V> Entry<V> {
    /// LFU-with-aging score: frequently used entries survive, but an old
    /// entry must keep earning its place.
    fn score(&self) -> i64 {
        let accesses = self.accesses.load(Ordering::Relaxed) as i64;
        accesses - self.created.elapsed().as_secs() as i64
    }
}

pub struct MemoryCache<V> {
    entries: RwLock<AHashMap<Fingerprint, Entry<V>>>,
    capacity: usize,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<V> MemoryCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(AHashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concurrent lookups take the read lock only; the access counter is
    /// atomic so readers never contend with each other.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<V>> {
        let map = self.entries.read().ok()?;
        let entry = map.get(fingerprint)?;
        entry.accesses.fetch_add(1, Ordering::Relaxed);
        Some(Arc::clone(&entry.value))
    }

    pub fn insert(&self, fingerprint: Fingerprint, value: Arc<V>) {
        let Ok(mut map) = self.entries.write() else {
            return;
        };
        if map.len() >= self.capacity && !map.contains_key(&fingerprint) {
            Self::evict(&mut map, self.capacity);
        }
        map.insert(
            fingerprint,
            Entry {
                value,
                accesses: AtomicU64::new(1),
                created: Instant::now(),
            },
        );
    }

    /// Drop the 25% of entries with the lowest score.
    fn evict(map: &mut AHashMap<Fingerprint, Entry<V>>, capacity: usize) {
        let drop_count = (capacity / 4).max(1);
        let mut scored: Vec<(Fingerprint, i64)> =
            map.iter().map(|(k, e)| (*k, e.score())).collect();
        scored.sort_by_key(|(_, score)| *score);
        for (key, _) in scored.into_iter().take(drop_count) {
            map.remove(&key);
        }
        debug!(target: "cache", dropped = drop_count, remaining = map.len(), "cache_evict");
    }

    pub fn clear(&self) {
        if let Ok(mut map) = self.entries.write() {
            map.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_catalog::{Stage, Version};

    fn fp(tag: u8) -> Fingerprint {
        Fingerprint::compute(
            &format!("shader-{tag}"),
            Stage::Fragment,
            None,
            Version::V330,
            1,
            false,
        )
    }

    #[test]
    fn get_after_insert() {
        let cache: MemoryCache<String> = MemoryCache::new(8);
        cache.insert(fp(1), Arc::new("one".to_owned()));
        assert_eq!(cache.get(&fp(1)).as_deref(), Some(&"one".to_owned()));
        assert!(cache.get(&fp(2)).is_none());
    }

    #[test]
    fn eviction_keeps_hot_entries() {
        let cache: MemoryCache<u32> = MemoryCache::new(8);
        for i in 0..8 {
            cache.insert(fp(i), Arc::new(i as u32));
        }
        // Heat up entries 4..8.
        for _ in 0..50 {
            for i in 4..8 {
                cache.get(&fp(i));
            }
        }
        cache.insert(fp(100), Arc::new(100));
        assert!(cache.len() <= 8);
        for i in 4..8 {
            assert!(cache.get(&fp(i)).is_some(), "hot entry {i} evicted");
        }
        assert!(cache.get(&fp(100)).is_some());
    }

    #[test]
    fn eviction_drops_a_quarter() {
        let cache: MemoryCache<u32> = MemoryCache::new(8);
        for i in 0..8 {
            cache.insert(fp(i), Arc::new(i as u32));
        }
        cache.insert(fp(99), Arc::new(99));
        // 8 - 2 evicted + 1 inserted.
        assert_eq!(cache.len(), 7);
    }

    #[test]
    fn reinsert_at_capacity_does_not_evict() {
        let cache: MemoryCache<u32> = MemoryCache::new(4);
        for i in 0..4 {
            cache.insert(fp(i), Arc::new(i as u32));
        }
        cache.insert(fp(0), Arc::new(42));
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get(&fp(0)).as_deref(), Some(&42));
    }

    #[test]
    fn concurrent_readers() {
        let cache: Arc<MemoryCache<u32>> = Arc::new(MemoryCache::new(16));
        cache.insert(fp(1), Arc::new(7));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        assert_eq!(cache.get(&fp(1)).as_deref(), Some(&7));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("reader thread panicked");
        }
    }
}
