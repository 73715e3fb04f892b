//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::cache::CacheStrategy;

/// Type-erased cached value.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

// == Cache Entry ==
/// One memoized result with its lifetime.
#[derive(Clone)]
pub struct CacheEntry {
    /// The stored value, opaque to the cache
    pub value: CachedValue,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Strategy the entry was stored under, if known
    pub strategy: Option<CacheStrategy>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry created at `now` that lives for `ttl_seconds`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `now` - Creation time in Unix milliseconds
    /// * `ttl_seconds` - Lifetime in seconds
    /// * `strategy` - Originating strategy tag
    pub fn new(
        value: CachedValue,
        now: u64,
        ttl_seconds: u64,
        strategy: Option<CacheStrategy>,
    ) -> Self {
        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl_seconds.saturating_mul(1000)),
            strategy,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now >= expires_at`. An entry whose expiry
    /// does not lie after its creation time is malformed and always counts
    /// as expired.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at <= self.created_at || now >= self.expires_at
    }

    /// Lifetime the entry was created with, in whole seconds.
    pub fn ttl_secs(&self) -> u64 {
        self.expires_at.saturating_sub(self.created_at) / 1000
    }

    /// Returns the value if it holds a `T`.
    pub fn downcast<T>(&self) -> Option<T>
    where
        T: Clone + 'static,
    {
        self.value.downcast_ref::<T>().cloned()
    }

    /// Rough footprint of the entry in bytes, excluding heap data owned by the value.
    pub fn estimated_size(&self) -> usize {
        std::mem::size_of::<Self>() + std::mem::size_of_val(&*self.value)
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
