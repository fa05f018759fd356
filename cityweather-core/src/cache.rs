use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tracing::debug;

use crate::model::{ForecastSet, WeatherSnapshot};

/// How long a cached response stays fresh.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(600);

struct CacheEntry<T> {
    fetched_at: Instant,
    payload: T,
}

/// One data-kind namespace: city id → cached payload.
struct Namespace<T> {
    entries: HashMap<i64, CacheEntry<T>>,
    ttl: Duration,
}

impl<T> Namespace<T> {
    fn new(ttl: Duration) -> Self {
        Self { entries: HashMap::new(), ttl }
    }

    fn get(&self, city_id: i64) -> Option<&T> {
        self.entries.get(&city_id).and_then(|entry| {
            if entry.fetched_at.elapsed() < self.ttl {
                Some(&entry.payload)
            } else {
                // Stale entries are replaced on the next put, never evicted.
                None
            }
        })
    }

    fn put(&mut self, city_id: i64, payload: T) {
        self.entries.insert(city_id, CacheEntry { fetched_at: Instant::now(), payload });
    }
}

/// Time-bounded cache for remote responses, with independent namespaces for
/// current weather and forecast data.
///
/// Unbounded by design: the key space is the city dataset and entries are
/// overwritten in place once stale. Confined to one logical thread of
/// control per session, so no interior locking.
pub struct ResponseCache {
    current: Namespace<WeatherSnapshot>,
    forecast: Namespace<ForecastSet>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_ttl(FRESHNESS_WINDOW)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { current: Namespace::new(ttl), forecast: Namespace::new(ttl) }
    }

    pub fn get_current(&self, city_id: i64) -> Option<&WeatherSnapshot> {
        let hit = self.current.get(city_id);
        debug!(city_id, hit = hit.is_some(), "current-weather cache lookup");
        hit
    }

    pub fn put_current(&mut self, city_id: i64, snapshot: WeatherSnapshot) {
        self.current.put(city_id, snapshot);
    }

    pub fn get_forecast(&self, city_id: i64) -> Option<&ForecastSet> {
        let hit = self.forecast.get(city_id);
        debug!(city_id, hit = hit.is_some(), "forecast cache lookup");
        hit
    }

    pub fn put_forecast(&mut self, city_id: i64, forecast: ForecastSet) {
        self.forecast.put(city_id, forecast);
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(temp: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            name: "London".into(),
            country: "GB".into(),
            temperature_k: temp,
            description: "light rain".into(),
        }
    }

    #[test]
    fn fresh_entry_is_returned() {
        let mut cache = ResponseCache::new();
        cache.put_current(1, snapshot(280.0));

        let hit = cache.get_current(1).expect("entry was just stored");
        assert_eq!(hit.temperature_k, 280.0);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        // A zero TTL makes every entry stale immediately: elapsed >= ttl.
        let mut cache = ResponseCache::with_ttl(Duration::ZERO);
        cache.put_current(1, snapshot(280.0));

        assert!(cache.get_current(1).is_none());
    }

    #[test]
    fn put_overwrites_prior_entry() {
        let mut cache = ResponseCache::new();
        cache.put_current(1, snapshot(280.0));
        cache.put_current(1, snapshot(290.0));

        assert_eq!(cache.get_current(1).unwrap().temperature_k, 290.0);
    }

    #[test]
    fn namespaces_are_independent() {
        let mut cache = ResponseCache::new();
        cache.put_current(1, snapshot(280.0));

        assert!(cache.get_forecast(1).is_none());
        assert!(cache.get_current(1).is_some());
    }

    #[test]
    fn miss_for_unknown_city() {
        let cache = ResponseCache::new();
        assert!(cache.get_current(42).is_none());
        assert!(cache.get_forecast(42).is_none());
    }
}
