//! Cache Service Module
//!
//! The shared, lock-protected cache handed to request handlers.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{
    CacheStats, CacheStore, CacheStrategy, Clock, Memoized, SystemClock, TtlPolicy, UserId,
};
use crate::config::CacheConfig;

// == Cache Service ==
/// Process-wide response cache.
///
/// One mutex guards both the entries and the user index, so every method
/// observes and leaves a consistent state. The lock is never held while a
/// memoized computation runs.
#[derive(Debug)]
pub struct CacheService {
    store: Mutex<CacheStore>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl CacheService {
    // == Constructors ==
    /// Creates an empty cache using the wall clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an empty cache driven by `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(CacheStore::new()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.config.ttl_policy
    }

    /// Effective TTL of `strategy` under the configured policy.
    pub fn ttl_seconds(&self, strategy: CacheStrategy) -> u64 {
        self.config.ttl_policy.ttl_seconds(strategy)
    }

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    // == Memoize ==
    /// Returns a memoizing handle for the computation named `identity`.
    pub fn memoize(
        self: &Arc<Self>,
        identity: impl Into<String>,
        strategy: CacheStrategy,
    ) -> Memoized {
        Memoized::new(Arc::clone(self), identity.into(), strategy)
    }

    // == Store Operations ==
    /// Returns the live value at `key` if it holds a `T`.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + 'static,
    {
        let now = self.now();
        self.store.lock().get(key, now)
    }

    /// Stores `value` at `key` for `ttl_secs` seconds.
    pub fn set<T>(&self, key: impl Into<String>, value: T, ttl_secs: u64)
    where
        T: Send + Sync + 'static,
    {
        let now = self.now();
        self.store.lock().set(key.into(), value, ttl_secs, None, now);
    }

    /// Stores `value` under the TTL of `strategy`, tagging the entry with it.
    pub fn set_with_strategy<T>(&self, key: impl Into<String>, value: T, strategy: CacheStrategy)
    where
        T: Send + Sync + 'static,
    {
        let ttl = self.ttl_seconds(strategy);
        let now = self.now();
        self.store
            .lock()
            .set(key.into(), value, ttl, Some(strategy), now);
    }

    /// Stores a memoized result and indexes it for `user` in one step.
    pub(crate) fn fill<T>(
        &self,
        key: String,
        value: T,
        strategy: CacheStrategy,
        user: Option<&UserId>,
    ) where
        T: Send + Sync + 'static,
    {
        let ttl = self.ttl_seconds(strategy);
        let now = self.now();
        let mut store = self.store.lock();
        store.set(key.clone(), value, ttl, Some(strategy), now);
        if let Some(user) = user {
            store.record(user, &key);
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        self.store.lock().delete(key)
    }

    /// Associates a stored `key` with `user` for later invalidation.
    ///
    /// Returns `false`, leaving the index untouched, when `key` holds no entry.
    pub fn record(&self, user: &UserId, key: &str) -> bool {
        let recorded = self.store.lock().record(user, key);
        if !recorded {
            debug!("Not indexing {} for user {}: no cache entry", key, user);
        }
        recorded
    }

    pub(crate) fn record_bypass(&self) {
        self.store.lock().record_bypass();
    }

    // == Administrative Operations ==
    /// Drops every entry created for `user`. Returns the number removed.
    pub fn invalidate_user(&self, user: &UserId) -> usize {
        let removed = self.store.lock().invalidate_user(user);
        info!("Invalidated {} cache entries for user {}", removed, user);
        removed
    }

    /// Drops every entry whose key starts with `prefix`.
    ///
    /// Passing a base key removes the unscoped entry and all of its
    /// user-scoped variants.
    pub fn invalidate_by_prefix(&self, prefix: &str) -> usize {
        let removed = self.store.lock().delete_by_prefix(prefix);
        info!("Invalidated {} cache entries with prefix {:?}", removed, prefix);
        removed
    }

    pub fn clear_all(&self) {
        self.store.lock().clear();
        info!("Cache cleared");
    }

    /// Physically removes expired entries. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.now();
        let removed = self.store.lock().sweep_expired(now);
        debug!("Swept {} expired cache entries", removed);
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.now();
        self.store.lock().stats(now, &self.config.ttl_policy)
    }

    /// Number of entries physically held.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.store.lock().contains_key(key)
    }

    /// Whether `user` currently has an index entry.
    pub fn is_user_indexed(&self, user: &UserId) -> bool {
        self.store.lock().index().contains_user(user)
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
