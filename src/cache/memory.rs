//! In-memory cache implementation with TTL and optional LRU eviction.

use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use lru::LruCache;

use crate::cache::{Cache, CacheError, CacheKey, CachedMetric, Result};

/// A single cache entry and the instant it stops being readable.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedMetric,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// Thread-safe in-process cache.
///
/// Expired entries are removed lazily when they are next accessed. When a
/// capacity is given, the least recently used entry is evicted once the
/// cache is full.
#[derive(Clone)]
pub struct MemoryCache {
    store: Arc<Mutex<LruCache<CacheKey, CacheEntry>>>,
    clock: Clock,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.store.lock().map(|store| store.len()).ok();

        f.debug_struct("MemoryCache").field("len", &len).finish()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MemoryCache {
    /// Create a cache that holds at most `max_entries` entries, or an
    /// unbounded cache if `max_entries` is `None`.
    pub fn new(max_entries: Option<NonZeroUsize>) -> Self {
        Self::with_clock(max_entries, Arc::new(Instant::now))
    }

    /// Create a cache that reads the current time from `clock`.
    pub fn with_clock(max_entries: Option<NonZeroUsize>, clock: Clock) -> Self {
        let store = match max_entries {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };

        Self {
            store: Arc::new(Mutex::new(store)),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<CacheKey, CacheEntry>>> {
        self.store
            .lock()
            .map_err(|error| CacheError::Unavailable(error.to_string()))
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<CachedMetric>> {
        let now = (self.clock)();
        let mut store = self.lock()?;

        match store.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        store.pop(key);
        Ok(None)
    }

    fn set(&self, key: CacheKey, value: CachedMetric, ttl: Duration) -> Result<()> {
        let expires_at = (self.clock)() + ttl;

        self.lock()?.put(key, CacheEntry { value, expires_at });

        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> Result<()> {
        self.lock()?.pop(key);

        Ok(())
    }

    fn delete_multiple(&self, keys: &[CacheKey]) -> Result<()> {
        let mut store = self.lock()?;

        for key in keys {
            store.pop(key);
        }

        Ok(())
    }
}

#[cfg(test)]
mod memory_cache_tests {
    use std::{
        num::NonZeroUsize,
        sync::{Arc, Mutex},
        time::{Duration, Instant},
    };

    use crate::{
        auth::UserID,
        cache::{Cache, CacheKey, CachedMetric, MemoryCache, MetricKind},
    };

    const TTL: Duration = Duration::from_secs(600);

    /// A clock that only moves when the test advances it.
    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<Instant>>);

    impl ManualClock {
        fn new() -> Self {
            Self(Arc::new(Mutex::new(Instant::now())))
        }

        fn advance(&self, duration: Duration) {
            *self.0.lock().unwrap() += duration;
        }

        fn cache(&self, max_entries: Option<NonZeroUsize>) -> MemoryCache {
            let clock = self.0.clone();
            MemoryCache::with_clock(max_entries, Arc::new(move || *clock.lock().unwrap()))
        }
    }

    fn key(user_id: i64, metric: MetricKind) -> CacheKey {
        CacheKey::new(UserID::new(user_id), metric)
    }

    fn years(values: &[i32]) -> CachedMetric {
        CachedMetric::TransactionYears(values.to_vec())
    }

    #[test]
    fn get_missing_key_returns_none() {
        let cache = MemoryCache::default();

        assert_eq!(cache.get(&key(1, MetricKind::TransactionYears)), Ok(None));
        assert_eq!(cache.has(&key(1, MetricKind::TransactionYears)), Ok(false));
    }

    #[test]
    fn set_then_get_returns_value() {
        let cache = MemoryCache::default();
        let key = key(1, MetricKind::TransactionYears);

        cache.set(key, years(&[2024, 2023]), TTL).unwrap();

        assert_eq!(cache.get(&key), Ok(Some(years(&[2024, 2023]))));
        assert_eq!(cache.has(&key), Ok(true));
    }

    #[test]
    fn set_overwrites_value_and_resets_expiry() {
        let clock = ManualClock::new();
        let cache = clock.cache(None);
        let key = key(1, MetricKind::TransactionYears);

        cache.set(key, years(&[2023]), TTL).unwrap();
        clock.advance(Duration::from_secs(300));
        cache.set(key, years(&[2024]), TTL).unwrap();
        clock.advance(Duration::from_secs(400));

        assert_eq!(cache.get(&key), Ok(Some(years(&[2024]))));
    }

    #[test]
    fn entry_expires_exactly_at_ttl() {
        let clock = ManualClock::new();
        let cache = clock.cache(None);
        let key = key(1, MetricKind::TransactionYears);
        cache.set(key, years(&[2024]), TTL).unwrap();

        clock.advance(TTL - Duration::from_millis(1));
        assert_eq!(cache.get(&key), Ok(Some(years(&[2024]))));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get(&key), Ok(None));
        assert_eq!(cache.has(&key), Ok(false));
    }

    #[test]
    fn delete_removes_entry_and_ignores_missing_keys() {
        let cache = MemoryCache::default();
        let key = key(1, MetricKind::TransactionYears);
        cache.set(key, years(&[2024]), TTL).unwrap();

        cache.delete(&key).unwrap();
        cache.delete(&key).unwrap();

        assert_eq!(cache.get(&key), Ok(None));
    }

    #[test]
    fn delete_multiple_only_touches_given_keys() {
        let cache = MemoryCache::default();
        let removed = [
            key(1, MetricKind::TransactionYears),
            key(1, MetricKind::MonthlyTotals { year: 2024 }),
        ];
        let kept = [
            key(1, MetricKind::MonthlyTotals { year: 2023 }),
            key(2, MetricKind::TransactionYears),
        ];
        for key in removed.iter().chain(kept.iter()) {
            cache.set(*key, years(&[2024]), TTL).unwrap();
        }

        cache.delete_multiple(&removed).unwrap();

        for key in &removed {
            assert_eq!(cache.get(key), Ok(None), "{key} should be deleted");
        }
        for key in &kept {
            assert!(cache.has(key).unwrap(), "{key} should be kept");
        }
    }

    #[test]
    fn bounded_cache_evicts_least_recently_used() {
        let cache = MemoryCache::new(NonZeroUsize::new(2));
        let first = key(1, MetricKind::TransactionYears);
        let second = key(2, MetricKind::TransactionYears);
        let third = key(3, MetricKind::TransactionYears);

        cache.set(first, years(&[1]), TTL).unwrap();
        cache.set(second, years(&[2]), TTL).unwrap();
        cache.get(&first).unwrap();
        cache.set(third, years(&[3]), TTL).unwrap();

        assert!(cache.has(&first).unwrap());
        assert!(!cache.has(&second).unwrap());
        assert!(cache.has(&third).unwrap());
    }

    #[test]
    fn poisoned_lock_is_unavailable() {
        let cache = MemoryCache::default();
        let poisoner = cache.clone();

        let _ = std::thread::spawn(move || {
            let _guard = poisoner.store.lock().unwrap();
            panic!("poison the cache lock");
        })
        .join();

        assert!(matches!(
            cache.get(&key(1, MetricKind::TransactionYears)),
            Err(crate::cache::CacheError::Unavailable(_))
        ));
    }
}
