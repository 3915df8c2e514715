//! In-memory caching
//!
//! TTL plus LRU cache used to deduplicate search traffic across jobs
//! that share sub-queries. Expiry is enforced on access, eviction on
//! insert; nothing runs in the background.

use inquest_core::traits::SearchCache;
use inquest_core::types::{SearchResultItem, SearchSettings};
use sha2::{Digest, Sha256};
use tracing::debug;
use std::{
    collections::HashMap,
    hash::Hash,
    sync::RwLock,
    time::{Duration, Instant},
};

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Option<Instant>,
    access_count: u64,
    last_accessed: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: ttl.map(|duration| now + duration),
            access_count: 0,
            last_accessed: now,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires_at| Instant::now() > expires_at)
            .unwrap_or(false)
    }

    fn access(&mut self) -> &T {
        self.access_count += 1;
        self.last_accessed = Instant::now();
        &self.value
    }
}

/// In-memory cache with TTL and LRU eviction
#[derive(Debug)]
pub struct MemoryCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    max_size: usize,
    default_ttl: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_access_count: u64,
}

impl<K, V> MemoryCache<K, V>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    pub fn new(max_size: usize, default_ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_size,
            default_ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write().unwrap();

        if let Some(entry) = entries.get_mut(key) {
            if entry.is_expired() {
                entries.remove(key);
                debug!("Cache entry expired and removed: {:?}", key);
                return None;
            }

            let value = entry.access().clone();
            debug!("Cache hit for key: {:?}", key);
            Some(value)
        } else {
            debug!("Cache miss for key: {:?}", key);
            None
        }
    }

    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let mut entries = self.entries.write().unwrap();

        if entries.len() >= self.max_size && !entries.contains_key(&key) {
            Self::evict_lru(&mut entries);
        }

        let ttl = ttl.or(self.default_ttl);
        entries.insert(key, CacheEntry::new(value, ttl));
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().unwrap().remove(key).map(|e| e.value)
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap();
        let mut total_access_count = 0;
        let mut expired_count = 0;
        for entry in entries.values() {
            total_access_count += entry.access_count;
            if entry.is_expired() {
                expired_count += 1;
            }
        }
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired_count,
            total_access_count,
        }
    }

    fn evict_lru(entries: &mut HashMap<K, CacheEntry<V>>) {
        // Prefer reclaiming an already expired entry
        if let Some(key) = entries
            .iter()
            .find(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
        {
            entries.remove(&key);
            return;
        }

        if let Some(key) = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone())
        {
            debug!("Evicting LRU cache entry: {:?}", key);
            entries.remove(&key);
        }
    }
}

/// Read-through cache for search results, keyed on a digest of the
/// normalized query and the requested count.
pub struct SearchResultCache {
    cache: MemoryCache<String, Vec<SearchResultItem>>,
}

impl SearchResultCache {
    pub fn new(settings: &SearchSettings) -> Self {
        Self {
            cache: MemoryCache::new(
                settings.cache_capacity,
                Some(Duration::from_secs(settings.cache_ttl_secs)),
            ),
        }
    }

    fn cache_key(query: &str, count: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}_{}", query.trim().to_lowercase(), count));
        format!("search:{:x}", hasher.finalize())
    }
}

impl SearchCache for SearchResultCache {
    fn get(&self, query: &str, count: usize) -> Option<Vec<SearchResultItem>> {
        self.cache.get(&Self::cache_key(query, count))
    }

    fn set(&self, query: &str, count: usize, results: Vec<SearchResultItem>) {
        self.cache.set(Self::cache_key(query, count), results, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_what_set_stored() {
        let cache: MemoryCache<String, u32> = MemoryCache::new(4, None);
        cache.set("a".to_string(), 1, None);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
    }

    #[test]
    fn expired_entries_vanish_on_access() {
        let cache: MemoryCache<String, u32> = MemoryCache::new(4, None);
        cache.set("a".to_string(), 1, Some(Duration::from_millis(0)));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn lru_eviction_keeps_recently_used_entries() {
        let cache: MemoryCache<String, u32> = MemoryCache::new(2, None);
        cache.set("a".to_string(), 1, None);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("b".to_string(), 2, None);
        std::thread::sleep(Duration::from_millis(2));

        // Touch "a" so "b" becomes the LRU entry
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        std::thread::sleep(Duration::from_millis(2));
        cache.set("c".to_string(), 3, None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"c".to_string()), Some(3));
    }

    #[test]
    fn search_cache_key_is_case_and_whitespace_insensitive() {
        let settings = SearchSettings::default();
        let cache = SearchResultCache::new(&settings);
        let results = vec![SearchResultItem {
            title: "t".to_string(),
            url: "https://a.org".to_string(),
            snippet: "s".to_string(),
        }];
        cache.set("  Rust Async  ", 5, results.clone());

        let hit = cache.get("rust async", 5).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].url, "https://a.org");

        // A different count is a different key
        assert!(cache.get("rust async", 10).is_none());
    }
}
