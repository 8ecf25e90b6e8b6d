//! In-memory cache of resolved route paths keyed by endpoint pair.

use dashmap::DashMap;
use sahayak_core::{GeoPoint, RoutePath};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct RouteCacheEntry {
    fetched_at: Instant,
    path: RoutePath,
}

/// Route paths cached for a fixed TTL, bounded in size.
#[derive(Debug)]
pub struct RouteCache {
    entries: DashMap<String, RouteCacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl RouteCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh cached path for the pair, if any.
    pub fn get(&self, start: &GeoPoint, end: &GeoPoint) -> Option<RoutePath> {
        if self.ttl.is_zero() {
            return None;
        }
        let key = route_cache_key(start, end);
        let entry = self.entries.get(&key)?;
        if entry.fetched_at.elapsed() <= self.ttl {
            return Some(entry.path.clone());
        }
        drop(entry);
        self.entries.remove(&key);
        None
    }

    pub fn insert(&self, start: &GeoPoint, end: &GeoPoint, path: RoutePath) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(
            route_cache_key(start, end),
            RouteCacheEntry {
                fetched_at: Instant::now(),
                path,
            },
        );
        self.prune();
    }

    /// Drop expired entries, then the oldest ones until within capacity.
    fn prune(&self) {
        let now = Instant::now();
        let mut entries: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fetched_at))
            .collect();

        for (key, fetched_at) in &entries {
            if now.duration_since(*fetched_at) > self.ttl {
                self.entries.remove(key);
            }
        }

        if self.entries.len() <= self.max_entries {
            return;
        }

        entries.sort_by_key(|(_, fetched_at)| *fetched_at);
        for (key, _) in entries {
            if self.entries.len() <= self.max_entries {
                break;
            }
            self.entries.remove(&key);
        }
    }
}

/// Endpoints rounded to ~0.1 m so repeated clicks on the same spot share a key.
fn route_cache_key(start: &GeoPoint, end: &GeoPoint) -> String {
    format!(
        "route:{:.6}:{:.6}:{:.6}:{:.6}",
        start.lat, start.lon, end.lat, end.lon
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> RoutePath {
        RoutePath::new(vec![GeoPoint::new(12.9, 77.5), GeoPoint::new(12.91, 77.5)])
    }

    #[test]
    fn returns_cached_path_for_same_pair() {
        let cache = RouteCache::new(Duration::from_secs(60), 8);
        let a = GeoPoint::new(12.9, 77.5);
        let b = GeoPoint::new(12.91, 77.5);
        cache.insert(&a, &b, path());

        assert_eq!(cache.get(&a, &b), Some(path()));
        assert_eq!(cache.get(&b, &a), None);
    }

    #[test]
    fn stays_within_capacity() {
        let cache = RouteCache::new(Duration::from_secs(60), 2);
        let end = GeoPoint::new(13.0, 77.0);
        for i in 0..4 {
            cache.insert(&GeoPoint::new(12.0 + i as f64, 77.0), &end, path());
        }
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entry_is_evicted_on_get() {
        let cache = RouteCache::new(Duration::from_millis(20), 8);
        let a = GeoPoint::new(12.9, 77.5);
        let b = GeoPoint::new(12.91, 77.5);
        cache.insert(&a, &b, path());
        assert_eq!(cache.len(), 1);

        std::thread::sleep(Duration::from_millis(60));

        assert!(cache.get(&a, &b).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache = RouteCache::new(Duration::ZERO, 8);
        let a = GeoPoint::new(12.9, 77.5);
        cache.insert(&a, &a, path());
        assert!(cache.is_empty());
        assert!(cache.get(&a, &a).is_none());
    }
}
