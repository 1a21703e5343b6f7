/// In-memory TTL cache for auxiliary lookups.
///
/// The engine attaches a human-readable place label to each notification.
/// Reverse geocoding is a network call against a rate-limited service, and
/// alert coordinates are fixed, so results are cached in-process with a
/// generous TTL. The cache is an explicit component owned by whoever builds
/// the engine — not global ambient state — and takes `now` as a parameter
/// so expiry is deterministic in tests.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;

/// A value plus the time it was fetched.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Map of keys to values that expire a fixed duration after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Returns the cached value if it is still fresh at `now`.
    ///
    /// Expiry is strict: an entry exactly `ttl` old is no longer served.
    /// Expired entries are left in place and overwritten on the next insert;
    /// the map is bounded by the alert count so there is nothing to reap.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        self.entries.get(key).and_then(|entry| {
            if now - entry.fetched_at < self.ttl {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    /// Inserts or refreshes a value, stamping it with `now`.
    pub fn insert(&mut self, key: K, value: V, now: DateTime<Utc>) {
        self.entries.insert(key, CacheEntry { value, fetched_at: now });
    }

    /// Fetches through the cache: returns the fresh cached value, or calls
    /// `fetch` and caches its result. A fetch failure is returned without
    /// poisoning the cache, so the next call retries.
    pub fn get_or_fetch<E>(
        &mut self,
        key: K,
        now: DateTime<Utc>,
        fetch: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key, now) {
            return Ok(value);
        }
        let value = fetch()?;
        self.insert(key, value.clone(), now);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_fresh_entry_is_served() {
        let mut cache: TtlCache<i64, String> = TtlCache::new(Duration::hours(24));
        cache.insert(1, "Fairbanks, AK".to_string(), fixed_now());

        let hit = cache.get(&1, fixed_now() + Duration::hours(23));
        assert_eq!(hit.as_deref(), Some("Fairbanks, AK"));
    }

    #[test]
    fn test_entry_exactly_at_ttl_is_expired() {
        let mut cache: TtlCache<i64, String> = TtlCache::new(Duration::hours(24));
        cache.insert(1, "Fairbanks, AK".to_string(), fixed_now());

        assert!(cache.get(&1, fixed_now() + Duration::hours(24)).is_none());
    }

    #[test]
    fn test_missing_key_is_none() {
        let cache: TtlCache<i64, String> = TtlCache::new(Duration::hours(24));
        assert!(cache.get(&7, fixed_now()).is_none());
    }

    #[test]
    fn test_get_or_fetch_skips_fetch_on_hit() {
        let mut cache: TtlCache<i64, String> = TtlCache::new(Duration::hours(24));
        cache.insert(1, "cached".to_string(), fixed_now());

        let result: Result<String, ()> = cache.get_or_fetch(1, fixed_now(), || {
            panic!("fetch must not run on a cache hit")
        });
        assert_eq!(result.unwrap(), "cached");
    }

    #[test]
    fn test_get_or_fetch_populates_on_miss() {
        let mut cache: TtlCache<i64, String> = TtlCache::new(Duration::hours(24));

        let result: Result<String, ()> =
            cache.get_or_fetch(1, fixed_now(), || Ok("resolved".to_string()));
        assert_eq!(result.unwrap(), "resolved");
        assert_eq!(cache.len(), 1);

        // Second call inside the TTL returns the cached copy.
        let result: Result<String, ()> = cache.get_or_fetch(
            1,
            fixed_now() + Duration::hours(1),
            || panic!("should be cached"),
        );
        assert_eq!(result.unwrap(), "resolved");
    }

    #[test]
    fn test_fetch_failure_does_not_poison_cache() {
        let mut cache: TtlCache<i64, String> = TtlCache::new(Duration::hours(24));

        let result: Result<String, &str> =
            cache.get_or_fetch(1, fixed_now(), || Err("geocoder down"));
        assert!(result.is_err());
        assert!(cache.is_empty());

        // A later call retries the fetch.
        let result: Result<String, &str> =
            cache.get_or_fetch(1, fixed_now(), || Ok("recovered".to_string()));
        assert_eq!(result.unwrap(), "recovered");
    }

    #[test]
    fn test_reinsert_refreshes_expiry() {
        let mut cache: TtlCache<i64, String> = TtlCache::new(Duration::hours(24));
        cache.insert(1, "old".to_string(), fixed_now());
        cache.insert(1, "new".to_string(), fixed_now() + Duration::hours(23));

        let hit = cache.get(&1, fixed_now() + Duration::hours(40));
        assert_eq!(hit.as_deref(), Some("new"));
    }
}
