//! Cache Statistics Module
//!
//! Lookup counters and the point-in-time snapshot reported to operators.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::{CacheStrategy, UserId};

// == Lookup Counters ==
/// Running totals of memoized lookups.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LookupCounters {
    /// Lookups answered from a live entry
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Calls that skipped the cache entirely
    pub bypasses: u64,
}

impl LookupCounters {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_bypass(&mut self) {
        self.bypasses += 1;
    }
}

// == Cache Stats ==
/// Snapshot of the cache state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Entries physically held, live or not
    pub total_entries: usize,
    /// Entries that would be served
    pub valid_entries: usize,
    /// Entries past their expiry, awaiting a sweep
    pub expired_entries: usize,
    /// Live entries per strategy
    pub strategy_distribution: BTreeMap<CacheStrategy, usize>,
    /// Indexed keys per user
    pub user_dependencies: BTreeMap<UserId, usize>,
    /// Estimated footprint in bytes
    pub memory_bytes: usize,
    /// `memory_bytes` in human-readable form
    pub memory_usage: String,
    /// Effective TTL in seconds of every strategy
    pub ttl_table: BTreeMap<CacheStrategy, u64>,
    pub hits: u64,
    pub misses: u64,
    pub bypasses: u64,
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn with_counters(mut self, counters: LookupCounters) -> Self {
        self.hits = counters.hits;
        self.misses = counters.misses;
        self.bypasses = counters.bypasses;
        self.hit_rate = counters.hit_rate();
        self
    }
}

/// Formats a byte count as `"12.34 KB"`, capping the unit at GB.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}
