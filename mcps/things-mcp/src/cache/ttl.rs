//! Time-bounded cache for slow-changing listings (areas, projects, tags)

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Entries expire `ttl` after insertion. Expired entries are dropped on read
/// and swept on every insert.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, (Instant, V)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries();
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries();
        let ttl = self.ttl;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        entries.insert(key.into(), (Instant::now(), value));
    }

    pub fn invalidate(&self, key: &str) {
        self.entries().remove(key);
    }

    /// Live and not-yet-swept entries
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_until_invalidated() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.insert("areas", vec!["Work".to_string()]);
        assert_eq!(cache.get("areas"), Some(vec!["Work".to_string()]));
        assert_eq!(cache.get("tags"), None);

        cache.invalidate("areas");
        assert_eq!(cache.get("areas"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("areas", 1);
        assert_eq!(cache.get("areas"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_sweeps_expired_entries() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.len(), 1);
    }
}
