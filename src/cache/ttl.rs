//! In-memory TTL cache backed by `DashMap` so readers never block.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use super::is_expired;
use crate::clock::SharedClock;

/// A stored value together with the moment it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
  pub value: V,
  pub stored_at: DateTime<Utc>,
}

/// Unbounded key/value cache with a single TTL for every entry.
///
/// Entries are never evicted by capacity. Expired entries stay in memory and
/// are skipped on read; a later `set` for the same key replaces them.
pub struct TtlCache<V> {
  store: DashMap<String, CacheEntry<V>>,
  ttl: Duration,
  clock: SharedClock,
}

impl<V: Clone> TtlCache<V> {
  pub fn new(ttl: Duration, clock: SharedClock) -> Self {
    Self {
      store: DashMap::new(),
      ttl,
      clock,
    }
  }

  /// Returns the value for `key` iff it is present and unexpired.
  pub fn get(&self, key: &str) -> Option<V> {
    let entry = self.store.get(key)?;
    if is_expired(entry.stored_at, self.clock.now(), self.ttl) {
      return None;
    }
    Some(entry.value.clone())
  }

  /// Stores `value` under `key` with the current time, replacing any prior entry.
  pub fn set(&self, key: impl Into<String>, value: V) {
    let entry = CacheEntry {
      value,
      stored_at: self.clock.now(),
    };
    self.store.insert(key.into(), entry);
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// Number of entries held, expired ones included.
  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.store.len()
  }
}

impl<V> std::fmt::Debug for TtlCache<V> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TtlCache")
      .field("entries", &self.store.len())
      .field("ttl", &self.ttl)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::default_ttl;
  use crate::clock::ManualClock;
  use std::sync::Arc;

  fn cache() -> (TtlCache<Vec<String>>, ManualClock) {
    let clock = ManualClock::new(Utc::now());
    (TtlCache::new(default_ttl(), Arc::new(clock.clone())), clock)
  }

  #[test]
  fn test_set_then_get() {
    let (cache, _) = cache();
    cache.set("batman-1", vec!["tt0372784".to_string()]);
    assert_eq!(cache.get("batman-1"), Some(vec!["tt0372784".to_string()]));
  }

  #[test]
  fn test_miss() {
    let (cache, _) = cache();
    assert_eq!(cache.get("nothing-1"), None);
  }

  #[test]
  fn test_expires_after_ttl() {
    let (cache, clock) = cache();
    cache.set("batman-1", vec!["a".to_string()]);

    clock.advance(Duration::minutes(4));
    assert!(cache.get("batman-1").is_some());

    clock.advance(Duration::minutes(1));
    assert_eq!(cache.get("batman-1"), None);
  }

  #[test]
  fn test_expired_entries_stay_in_memory() {
    let (cache, clock) = cache();
    cache.set("details-tt1", vec![]);
    clock.advance(Duration::minutes(10));

    assert_eq!(cache.get("details-tt1"), None);
    assert_eq!(cache.len(), 1);
  }

  #[test]
  fn test_overwrite_replaces() {
    let (cache, clock) = cache();
    cache.set("k", vec!["old".to_string(), "older".to_string()]);
    clock.advance(Duration::minutes(4));
    cache.set("k", vec!["new".to_string()]);

    assert_eq!(cache.get("k"), Some(vec!["new".to_string()]));

    // The refreshed entry carries its own timestamp
    clock.advance(Duration::minutes(2));
    assert_eq!(cache.get("k"), Some(vec!["new".to_string()]));
  }
}
