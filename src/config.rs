//! Configuration Module
//!
//! Handles loading server and cache configuration from environment variables.

use std::env;

use tracing::warn;

use crate::cache::TtlPolicy;

// == Cache Config ==
/// Settings that control caching behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Process runs in development mode
    pub development_mode: bool,
    /// Cache even in development mode
    pub cache_in_development: bool,
    /// Strategy TTL resolution
    pub ttl_policy: TtlPolicy,
}

impl CacheConfig {
    /// Loads cache settings from the process environment.
    ///
    /// # Environment Variables
    /// - `ENVIRONMENT` - `dev` or `development` enables development mode
    /// - `DEBUG` - `true` also enables development mode
    /// - `ENABLE_CACHE_IN_DEV` - `true` keeps caching on in development mode
    /// - `CACHE_TTL` - base TTL override in seconds (digits only)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads cache settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| {
            lookup(name)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        let environment = lookup("ENVIRONMENT").unwrap_or_default().to_lowercase();
        let development_mode =
            matches!(environment.as_str(), "dev" | "development") || flag("DEBUG");

        let raw_ttl = lookup("CACHE_TTL");
        let ttl_policy = TtlPolicy::from_raw(raw_ttl.as_deref());
        if let (Some(raw), None) = (&raw_ttl, ttl_policy.base_override()) {
            warn!("Ignoring malformed CACHE_TTL value {:?}, using default TTLs", raw);
        }

        Self {
            development_mode,
            cache_in_development: flag("ENABLE_CACHE_IN_DEV"),
            ttl_policy,
        }
    }

    /// Whether memoized calls should skip the cache entirely.
    pub fn bypass_cache(&self) -> bool {
        self.development_mode && !self.cache_in_development
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port of the maintenance API
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// Cache behavior
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - plus everything read by [`CacheConfig::from_env`]
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or(60),
            cache: CacheConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 60,
            cache: CacheConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStrategy;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> CacheConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CacheConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 60);
        assert!(!config.cache.bypass_cache());
    }

    #[test]
    fn test_cache_config_empty_environment() {
        let config = load(&[]);
        assert!(!config.development_mode);
        assert!(!config.cache_in_development);
        assert_eq!(config.ttl_policy, TtlPolicy::new());
    }

    #[test]
    fn test_development_mode_detection() {
        assert!(load(&[("ENVIRONMENT", "dev")]).development_mode);
        assert!(load(&[("ENVIRONMENT", "Development")]).development_mode);
        assert!(load(&[("DEBUG", "TRUE")]).development_mode);
        assert!(!load(&[("ENVIRONMENT", "production")]).development_mode);
        assert!(!load(&[("DEBUG", "1")]).development_mode);
    }

    #[test]
    fn test_bypass_rules() {
        assert!(load(&[("ENVIRONMENT", "dev")]).bypass_cache());
        assert!(!load(&[("ENVIRONMENT", "dev"), ("ENABLE_CACHE_IN_DEV", "true")]).bypass_cache());
        assert!(!load(&[("ENABLE_CACHE_IN_DEV", "true")]).bypass_cache());
    }

    #[test]
    fn test_ttl_override_loaded() {
        let config = load(&[("CACHE_TTL", "100")]);
        assert_eq!(config.ttl_policy.ttl_seconds(CacheStrategy::Long), 1200);

        let config = load(&[("CACHE_TTL", "fast")]);
        assert_eq!(config.ttl_policy.ttl_seconds(CacheStrategy::Long), 3600);
    }
}
