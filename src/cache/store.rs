//! Cache Store Module
//!
//! Entry storage combined with the per-user invalidation index. Every
//! operation takes the current time explicitly; locking is left to
//! [`CacheService`](crate::cache::CacheService).

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::stats::format_bytes;
use crate::cache::{
    CacheEntry, CacheStats, CacheStrategy, LookupCounters, TtlPolicy, UserId, UserIndex,
};

// == Cache Store ==
/// Key to entry mapping with user-scoped invalidation.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// User to key index
    index: UserIndex,
    /// Lookup statistics
    counters: LookupCounters,
}

impl CacheStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Retrieves a live value of type `T`.
    ///
    /// Expired entries and entries holding a different type are reported
    /// as misses. Expired entries stay in place until swept or overwritten.
    pub fn get<T>(&mut self, key: &str, now: u64) -> Option<T>
    where
        T: Clone + 'static,
    {
        let value = self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .and_then(CacheEntry::downcast::<T>);

        match value {
            Some(_) => self.counters.record_hit(),
            None => self.counters.record_miss(),
        }
        value
    }

    // == Set ==
    /// Stores a value for `ttl_secs` seconds, replacing any existing entry.
    ///
    /// A zero TTL cannot produce a live entry, so it only clears the key.
    pub fn set<T>(
        &mut self,
        key: String,
        value: T,
        ttl_secs: u64,
        strategy: Option<CacheStrategy>,
        now: u64,
    ) where
        T: Send + Sync + 'static,
    {
        if ttl_secs == 0 {
            self.delete(&key);
            return;
        }

        let entry = CacheEntry::new(Arc::new(value), now, ttl_secs, strategy);
        self.entries.insert(key, entry);
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.index.forget_key(key);
        self.entries.remove(key).is_some()
    }

    // == Delete By Prefix ==
    /// Removes every entry whose key starts with `prefix`.
    pub fn delete_by_prefix(&mut self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &keys {
            self.delete(key);
        }
        keys.len()
    }

    // == Record ==
    /// Associates a stored `key` with `user` for later invalidation.
    ///
    /// Keys without an entry are not indexed. Returns whether the key was
    /// recorded.
    pub fn record(&mut self, user: &UserId, key: &str) -> bool {
        if !self.entries.contains_key(key) {
            return false;
        }
        self.index.record(user, key);
        true
    }

    // == Invalidate User ==
    /// Removes every entry recorded for `user` and the user's index entry.
    ///
    /// Returns the number of entries removed from the store.
    pub fn invalidate_user(&mut self, user: &UserId) -> usize {
        let mut removed = 0;
        for key in self.index.take_user(user) {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    // == Clear ==
    /// Drops all entries and the whole index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    // == Sweep Expired ==
    /// Removes all entries expired at `now`. Returns the number removed.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.delete(key);
        }
        expired_keys.len()
    }

    // == Counters ==
    pub fn record_bypass(&mut self) {
        self.counters.record_bypass();
    }

    pub fn counters(&self) -> LookupCounters {
        self.counters
    }

    // == Stats ==
    /// Builds a snapshot at `now`.
    ///
    /// Live entries stored without a strategy tag are attributed to the
    /// strategy whose effective TTL is closest to theirs.
    pub fn stats(&self, now: u64, policy: &TtlPolicy) -> CacheStats {
        let mut stats = CacheStats {
            total_entries: self.entries.len(),
            ttl_table: policy.table(),
            ..CacheStats::default()
        };

        let mut memory_bytes = 0;
        for (key, entry) in &self.entries {
            memory_bytes += key.len() + entry.estimated_size();

            if entry.is_expired(now) {
                stats.expired_entries += 1;
                continue;
            }
            stats.valid_entries += 1;

            let strategy = entry
                .strategy
                .unwrap_or_else(|| policy.closest_strategy(entry.ttl_secs()));
            *stats.strategy_distribution.entry(strategy).or_default() += 1;
        }

        for (user, count) in self.index.counts() {
            memory_bytes += user.as_str().len();
            stats.user_dependencies.insert(user.clone(), count);
        }
        memory_bytes += self.index.keys().map(String::len).sum::<usize>();

        stats.memory_bytes = memory_bytes;
        stats.memory_usage = format_bytes(memory_bytes);
        stats.with_counters(self.counters)
    }

    // == Length ==
    /// Returns the number of entries physically held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn index(&self) -> &UserIndex {
        &self.index
    }
}
