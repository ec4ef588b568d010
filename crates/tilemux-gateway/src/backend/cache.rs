//! Time-bounded [`ValueCache`] implementation.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tilemux_kernel::ValueCache;

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// [`ValueCache`] whose entries expire a fixed `ttl` after being stored.
///
/// Expired entries read as misses and are removed on the read that finds
/// them; [`purge_expired`](TtlCache::purge_expired) clears the rest and is
/// meant to run periodically from a background task.
pub struct TtlCache<V> {
    entries: DashMap<String, Entry<V>>,
    ttl: Duration,
}

impl<V> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.duration_since(entry.stored_at) < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> ValueCache<V> for TtlCache<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if now.duration_since(entry.stored_at) < self.ttl {
                return Some(entry.value.clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| now.duration_since(entry.stored_at) >= self.ttl);
        None
    }

    fn set(&self, key: &str, value: V) -> V {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_returns_values() {
        let cache = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.set("k", 7), 7);
        assert_eq!(cache.get("k"), Some(7));
    }

    #[test]
    fn last_writer_wins() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("k", 1);
        cache.set("k", 2);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_misses_and_removed() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.set("k", "v".to_string());
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_keeps_live_entries() {
        let live = TtlCache::new(Duration::from_secs(60));
        live.set("a", 1);
        live.purge_expired();
        assert_eq!(live.len(), 1);

        let dead = TtlCache::new(Duration::ZERO);
        dead.set("a", 1);
        dead.purge_expired();
        assert!(dead.is_empty());
    }
}
