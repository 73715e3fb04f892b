//! Memoizing Wrapper Module
//!
//! Wraps computations so repeated calls with the same arguments are served
//! from the cache until their strategy TTL runs out.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{derive_key, CacheService, CacheStrategy, CallArgs, UserId};

/// Outcome of consulting the cache before running a computation.
enum Lookup<T> {
    /// Live cached value
    Hit(T),
    /// Nothing live; store the result under this slot
    Miss(Slot),
    /// Run the computation without touching the cache
    Bypass,
}

/// Where a freshly computed result goes.
struct Slot {
    key: String,
    user: Option<UserId>,
}

// == Memoized ==
/// Memoizing handle for one named computation.
///
/// Racing misses on the same key each run the computation; the last
/// write wins.
///
/// ```
/// use std::sync::Arc;
/// use crm_cache::cache::{CacheService, CacheStrategy, CallArgs};
///
/// let cache = Arc::new(CacheService::default());
/// let top_clients = cache.memoize("crm::top_clients", CacheStrategy::Dashboard);
///
/// let first: Vec<String> = top_clients.call_sync(CallArgs::new().arg(&3), || {
///     vec!["Acme".to_string()]
/// });
/// let second: Vec<String> = top_clients.call_sync(CallArgs::new().arg(&3), || {
///     unreachable!("served from cache")
/// });
/// assert_eq!(first, second);
/// ```
#[derive(Debug, Clone)]
pub struct Memoized {
    cache: Arc<CacheService>,
    identity: String,
    strategy: CacheStrategy,
    user_dependent: bool,
}

impl Memoized {
    pub(crate) fn new(cache: Arc<CacheService>, identity: String, strategy: CacheStrategy) -> Self {
        Self {
            cache,
            identity,
            strategy,
            user_dependent: false,
        }
    }

    /// Scopes cached results to the user attached to each call's arguments.
    pub fn user_dependent(mut self, user_dependent: bool) -> Self {
        self.user_dependent = user_dependent;
        self
    }

    /// Cache key a call with `args` would use, or `None` when it cannot be derived.
    pub fn key_for(&self, args: &CallArgs) -> Option<String> {
        derive_key(&self.identity, args, self.scoped_user(args)).ok()
    }

    // == Call ==
    /// Runs an async computation through the cache.
    pub async fn call<T, F, Fut>(&self, args: CallArgs, compute: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.lookup(&args) {
            Lookup::Hit(value) => value,
            Lookup::Miss(slot) => {
                let value = compute().await;
                self.fill(slot, value.clone());
                value
            }
            Lookup::Bypass => compute().await,
        }
    }

    /// Runs a fallible async computation through the cache.
    ///
    /// Only `Ok` values are cached; errors are returned untouched.
    pub async fn try_call<T, E, F, Fut>(&self, args: CallArgs, compute: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.lookup(&args) {
            Lookup::Hit(value) => Ok(value),
            Lookup::Miss(slot) => {
                let value = compute().await?;
                self.fill(slot, value.clone());
                Ok(value)
            }
            Lookup::Bypass => compute().await,
        }
    }

    /// Runs a blocking computation through the cache.
    pub fn call_sync<T, F>(&self, args: CallArgs, compute: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        match self.lookup(&args) {
            Lookup::Hit(value) => value,
            Lookup::Miss(slot) => {
                let value = compute();
                self.fill(slot, value.clone());
                value
            }
            Lookup::Bypass => compute(),
        }
    }

    // == Internals ==
    fn scoped_user<'a>(&self, args: &'a CallArgs) -> Option<&'a UserId> {
        if self.user_dependent {
            args.user()
        } else {
            None
        }
    }

    fn lookup<T>(&self, args: &CallArgs) -> Lookup<T>
    where
        T: Clone + 'static,
    {
        if self.cache.config().bypass_cache() {
            self.cache.record_bypass();
            debug!("Development mode, bypassing cache for {}", self.identity);
            return Lookup::Bypass;
        }

        let user = self.scoped_user(args);
        let key = match derive_key(&self.identity, args, user) {
            Ok(key) => key,
            Err(e) => {
                self.cache.record_bypass();
                warn!("Bypassing cache for {}: {}", self.identity, e);
                return Lookup::Bypass;
            }
        };

        match self.cache.get::<T>(&key) {
            Some(value) => {
                debug!("Cache hit for {} ({})", self.identity, key);
                Lookup::Hit(value)
            }
            None => {
                debug!("Cache miss for {} ({})", self.identity, key);
                Lookup::Miss(Slot {
                    key,
                    user: user.cloned(),
                })
            }
        }
    }

    fn fill<T>(&self, slot: Slot, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.cache
            .fill(slot.key, value, self.strategy, slot.user.as_ref());
    }
}
