//! User Index Module
//!
//! Tracks which cache keys were created on behalf of which user so that a
//! user's entries can be invalidated without scanning the whole store.

use std::collections::{HashMap, HashSet};

use crate::cache::UserId;

// == User Index ==
/// Bidirectional mapping between users and the cache keys recorded for them.
///
/// `owners` mirrors `by_user` so removing one key only touches the users
/// that reference it.
#[derive(Debug, Default)]
pub struct UserIndex {
    by_user: HashMap<UserId, HashSet<String>>,
    owners: HashMap<String, HashSet<UserId>>,
}

impl UserIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Record ==
    /// Adds `key` to the set of keys held for `user`.
    pub fn record(&mut self, user: &UserId, key: &str) {
        self.by_user
            .entry(user.clone())
            .or_default()
            .insert(key.to_string());
        self.owners
            .entry(key.to_string())
            .or_default()
            .insert(user.clone());
    }

    // == Take User ==
    /// Removes the user's entry and returns its keys.
    ///
    /// The returned keys are also dropped from every other user that
    /// referenced them, since the caller is about to delete them.
    pub fn take_user(&mut self, user: &UserId) -> HashSet<String> {
        let keys = self.by_user.remove(user).unwrap_or_default();
        for key in &keys {
            self.forget_key(key);
        }
        keys
    }

    // == Forget Key ==
    /// Removes `key` from every user set, dropping sets that become empty.
    pub fn forget_key(&mut self, key: &str) {
        let Some(users) = self.owners.remove(key) else {
            return;
        };
        for user in users {
            if let Some(keys) = self.by_user.get_mut(&user) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_user.remove(&user);
                }
            }
        }
    }

    // == Queries ==
    /// Every key referenced by at least one user.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.owners.keys()
    }

    pub fn contains_user(&self, user: &UserId) -> bool {
        self.by_user.contains_key(user)
    }

    /// Number of keys recorded per user.
    pub fn counts(&self) -> impl Iterator<Item = (&UserId, usize)> {
        self.by_user.iter().map(|(user, keys)| (user, keys.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.by_user.clear();
        self.owners.clear();
    }
}
