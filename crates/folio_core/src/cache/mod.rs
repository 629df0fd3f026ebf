//! Client-side query cache and invalidation registry.
//!
//! # Responsibility
//! - Hold decoded read results keyed by collection or by record.
//! - Let wrapped mutators mark keys stale or evict them after a write.
//!
//! # Invariants
//! - A stale or expired entry is never served by `get`.
//! - Keys match exactly; invalidating a collection does not touch records.
//! - A poisoned shared lock is recovered, not propagated as a panic.

use crate::clock::{Clock, SystemClock};
use crate::model::record::RecordKind;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

mod client;

pub use client::{ArticleClient, PostClient};

/// Default freshness window for cached reads.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Query cache shared between UI-facing callers.
pub type SharedQueryCache = Arc<Mutex<QueryCache>>;

/// Cache key for one read shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// The full list of a record kind.
    Collection(RecordKind),
    /// One record, keyed by the id string the caller asked for.
    Record(RecordKind, String),
}

impl CacheKey {
    pub fn collection(kind: RecordKind) -> Self {
        Self::Collection(kind)
    }

    pub fn record(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::Record(kind, id.into())
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collection(kind) => write!(f, "{}", kind.collection()),
            Self::Record(kind, id) => write!(f, "{}/{id}", kind.collection()),
        }
    }
}

/// One cached read result.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Value,
    pub fetched_at_ms: i64,
    pub stale: bool,
}

/// Key-value registry of cached read results.
pub struct QueryCache {
    stale_time_ms: i64,
    clock: Arc<dyn Clock + Send + Sync>,
    entries: BTreeMap<CacheKey, CacheEntry>,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self::with_clock(stale_time, Arc::new(SystemClock))
    }

    pub fn with_clock(stale_time: Duration, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            stale_time_ms: i64::try_from(stale_time.as_millis()).unwrap_or(i64::MAX),
            clock,
            entries: BTreeMap::new(),
        }
    }

    /// Wraps a new cache for sharing across callers.
    pub fn shared(stale_time: Duration) -> SharedQueryCache {
        Arc::new(Mutex::new(Self::new(stale_time)))
    }

    /// Returns the cached value when it is present, not stale, and younger
    /// than the stale time.
    pub fn get(&self, key: &CacheKey) -> Option<&Value> {
        let entry = self.entries.get(key)?;
        if entry.stale || self.is_expired(entry) {
            return None;
        }
        Some(&entry.value)
    }

    /// Returns the raw entry regardless of freshness.
    pub fn peek(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether a present entry would be refetched on the next read.
    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.stale || self.is_expired(entry))
    }

    /// Stores a fresh value, replacing any previous entry.
    pub fn put(&mut self, key: CacheKey, value: Value) {
        let entry = CacheEntry {
            value,
            fetched_at_ms: self.clock.now_epoch_ms(),
            stale: false,
        };
        self.entries.insert(key, entry);
    }

    /// Marks an entry stale but keeps its value. Returns whether it existed.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    /// Evicts an entry. Returns whether it existed.
    pub fn remove(&mut self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.clock
            .now_epoch_ms()
            .saturating_sub(entry.fetched_at_ms)
            > self.stale_time_ms
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

/// Locks a shared cache, recovering the registry from a poisoned lock.
pub fn lock_cache(cache: &SharedQueryCache) -> MutexGuard<'_, QueryCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::{CacheKey, QueryCache};
    use crate::clock::ManualClock;
    use crate::model::record::RecordKind;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn cache_at(clock: &ManualClock) -> QueryCache {
        QueryCache::with_clock(Duration::from_secs(60), Arc::new(clock.clone()))
    }

    #[test]
    fn invalidate_keeps_value_but_stops_serving_it() {
        let clock = ManualClock::starting_at(0);
        let mut cache = cache_at(&clock);
        let key = CacheKey::collection(RecordKind::Article);

        cache.put(key.clone(), json!([1, 2]));
        assert_eq!(cache.get(&key), Some(&json!([1, 2])));

        assert!(cache.invalidate(&key));
        assert_eq!(cache.get(&key), None);
        assert!(cache.is_stale(&key));
        assert_eq!(cache.peek(&key).map(|entry| &entry.value), Some(&json!([1, 2])));
    }

    #[test]
    fn remove_evicts_and_reports_absence() {
        let clock = ManualClock::starting_at(0);
        let mut cache = cache_at(&clock);
        let key = CacheKey::record(RecordKind::Post, "abc");

        cache.put(key.clone(), json!({"id": "abc"}));
        assert!(cache.remove(&key));
        assert!(!cache.contains(&key));
        assert!(!cache.remove(&key));
        assert!(!cache.invalidate(&key));
    }

    #[test]
    fn entries_expire_after_stale_time() {
        let clock = ManualClock::starting_at(10_000);
        let mut cache = cache_at(&clock);
        let key = CacheKey::collection(RecordKind::Post);
        cache.put(key.clone(), json!([]));

        clock.advance_ms(60_000);
        assert!(cache.get(&key).is_some());
        clock.advance_ms(1);
        assert!(cache.get(&key).is_none());
        assert!(cache.is_stale(&key));
    }

    #[test]
    fn collection_and_record_keys_are_independent() {
        let clock = ManualClock::starting_at(0);
        let mut cache = cache_at(&clock);
        let list = CacheKey::collection(RecordKind::Article);
        let one = CacheKey::record(RecordKind::Article, "a1");
        cache.put(list.clone(), json!([]));
        cache.put(one.clone(), json!({}));

        cache.invalidate(&list);
        assert!(cache.get(&one).is_some());
        assert_eq!(one.to_string(), "articles/a1");
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
