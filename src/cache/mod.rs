//! Cache Module
//!
//! In-process response cache: strategy TTL tiers, deterministic key
//! derivation, per-user invalidation and a memoizing wrapper.

mod clock;
mod entry;
mod float_check;
mod index;
mod key;
mod memoize;
mod service;
mod stats;
mod store;
mod strategy;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, CachedValue};
pub use index::UserIndex;
pub use key::{
    base_key, derive_key, CallArgs, TransportArtifact, UserId, UserScope, USER_KEY_MARKER,
};
pub use memoize::Memoized;
pub use service::CacheService;
pub use stats::{format_bytes, CacheStats, LookupCounters};
pub use store::CacheStore;
pub use strategy::{CacheStrategy, TtlPolicy};
