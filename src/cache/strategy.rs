//! Cache Strategy Module
//!
//! Named TTL tiers and the environment-driven override that rescales them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// == Cache Strategy ==
/// A named TTL policy applied to a class of cached computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    /// Volatile lists and counters
    Short,
    /// General purpose reads
    Medium,
    /// Reference data that rarely changes
    Long,
    /// Dashboard aggregates
    Dashboard,
    /// Per-user profile data
    User,
    /// Analytics reports
    Analytics,
}

impl CacheStrategy {
    /// Every strategy, in declaration order.
    pub const ALL: [CacheStrategy; 6] = [
        CacheStrategy::Short,
        CacheStrategy::Medium,
        CacheStrategy::Long,
        CacheStrategy::Dashboard,
        CacheStrategy::User,
        CacheStrategy::Analytics,
    ];

    /// Fixed TTL in seconds when no override is configured.
    pub fn default_ttl(self) -> u64 {
        match self {
            CacheStrategy::Short => 30,
            CacheStrategy::Medium => 300,
            CacheStrategy::Long => 3600,
            CacheStrategy::Dashboard => 120,
            CacheStrategy::User => 600,
            CacheStrategy::Analytics => 900,
        }
    }

    /// Override multiplier expressed in tenths (SHORT = 0.1x = 1/10).
    ///
    /// Integer tenths keep `floor(base * multiplier)` exact for every base.
    fn multiplier_tenths(self) -> u64 {
        match self {
            CacheStrategy::Short => 1,
            CacheStrategy::Medium => 10,
            CacheStrategy::Long => 120,
            CacheStrategy::Dashboard => 4,
            CacheStrategy::User => 20,
            CacheStrategy::Analytics => 30,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CacheStrategy::Short => "short",
            CacheStrategy::Medium => "medium",
            CacheStrategy::Long => "long",
            CacheStrategy::Dashboard => "dashboard",
            CacheStrategy::User => "user",
            CacheStrategy::Analytics => "analytics",
        }
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == TTL Policy ==
/// Resolves a strategy to its effective TTL, applying the base override if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TtlPolicy {
    base_override: Option<u64>,
}

impl TtlPolicy {
    /// Policy using the fixed per-strategy defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy scaling every strategy from one base value.
    pub fn with_override(base: u64) -> Self {
        Self {
            base_override: Some(base),
        }
    }

    /// Builds a policy from a raw override string.
    ///
    /// Only plain ASCII digits are accepted. Anything else (signs, whitespace,
    /// overflow) yields the default policy.
    pub fn from_raw(raw: Option<&str>) -> Self {
        Self {
            base_override: raw.and_then(parse_override),
        }
    }

    pub fn base_override(&self) -> Option<u64> {
        self.base_override
    }

    /// Effective TTL in seconds for `strategy`.
    pub fn ttl_seconds(&self, strategy: CacheStrategy) -> u64 {
        match self.base_override {
            Some(base) => base.saturating_mul(strategy.multiplier_tenths()) / 10,
            None => strategy.default_ttl(),
        }
    }

    /// Effective TTL of every strategy.
    pub fn table(&self) -> BTreeMap<CacheStrategy, u64> {
        CacheStrategy::ALL
            .iter()
            .map(|&strategy| (strategy, self.ttl_seconds(strategy)))
            .collect()
    }

    /// Strategy whose effective TTL is closest to `ttl_secs`.
    ///
    /// Ties resolve to the strategy declared first.
    pub fn closest_strategy(&self, ttl_secs: u64) -> CacheStrategy {
        let mut best = CacheStrategy::Short;
        let mut best_diff = u64::MAX;
        for strategy in CacheStrategy::ALL {
            let diff = self.ttl_seconds(strategy).abs_diff(ttl_secs);
            if diff < best_diff {
                best = strategy;
                best_diff = diff;
            }
        }
        best
    }
}

fn parse_override(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
