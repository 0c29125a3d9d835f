//! # Keyspace
//!
//! The state owned by the in-memory engine: one map per data type, and one expiry table.
//!
//! Data types live in independent namespaces, so the same key text may hold a scalar,
//! a hash, a list, a set and a sorted set at the same time. A type-specific operation
//! only ever touches its own namespace. Key-level operations (delete, exists, expire,
//! ttl, keys, clear) and expiry apply to the key across all namespaces.
//!
//! Keyspace methods don't check expiry themselves: the caller purges an expired key with
//! [`Keyspace::remove_if_expired`] before operating on it.

mod hash;
mod list;
mod scalar;
mod set;
mod zset;

use super::sorted_set::SortedSet;
use crate::constants::{TTL_MISSING_KEY, TTL_NO_EXPIRY};
use crate::expiry::ExpiryTable;
use crate::pattern::KeyPattern;
use crate::types::{ExpirationTimeType, StorageKey, Value};
use log::trace;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Per-type maps of keys to their data, plus keys' expiration times
#[derive(Debug, Default)]
pub struct Keyspace {
    scalars: HashMap<StorageKey, Value>,
    hashes: HashMap<StorageKey, HashMap<String, Value>>,
    lists: HashMap<StorageKey, VecDeque<Value>>,
    sets: HashMap<StorageKey, HashSet<String>>,
    zsets: HashMap<StorageKey, SortedSet>,
    expiry: ExpiryTable,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the key holds data in at least one namespace, regardless of its expiry
    pub fn contains(&self, key: &str) -> bool {
        self.scalars.contains_key(key)
            || self.hashes.contains_key(key)
            || self.lists.contains_key(key)
            || self.sets.contains_key(key)
            || self.zsets.contains_key(key)
    }

    pub fn expiry(&self) -> &ExpiryTable {
        &self.expiry
    }

    /// Whether the key has an expiration time that has passed
    pub fn is_expired(&self, key: &str, now: ExpirationTimeType) -> bool {
        self.expiry.is_expired(key, now)
    }

    /// Purges the key from every namespace if it has expired.
    ///
    /// Returns `true` if the key was purged.
    pub fn remove_if_expired(&mut self, key: &str, now: ExpirationTimeType) -> bool {
        if self.expiry.is_expired(key, now) {
            self.remove(key);
            trace!("Evicted expired key '{key}'");
            true
        } else {
            false
        }
    }

    /// Removes the key from every namespace, along with its expiration time.
    ///
    /// Returns `true` if the key held any data.
    pub fn remove(&mut self, key: &str) -> bool {
        let mut removed = self.scalars.remove(key).is_some();
        removed |= self.hashes.remove(key).is_some();
        removed |= self.lists.remove(key).is_some();
        removed |= self.sets.remove(key).is_some();
        removed |= self.zsets.remove(key).is_some();
        self.expiry.remove(key);
        removed
    }

    /// Sets an absolute expiration time, but only on a key that holds data.
    pub fn expire(&mut self, key: &str, deadline: ExpirationTimeType) -> bool {
        if self.contains(key) {
            self.expiry.set(key, deadline);
            true
        } else {
            false
        }
    }

    /// Removes the expiration time of a key. Returns `true` if there was one.
    pub fn persist(&mut self, key: &str) -> bool {
        self.contains(key) && self.expiry.remove(key)
    }

    /// Seconds to live: [`TTL_MISSING_KEY`] for an absent key, [`TTL_NO_EXPIRY`] for a
    /// key without expiration time, the remaining whole seconds otherwise.
    pub fn ttl(&self, key: &str, now: ExpirationTimeType) -> i64 {
        if !self.contains(key) || self.expiry.is_expired(key, now) {
            return TTL_MISSING_KEY;
        }
        self.expiry
            .remaining_secs(key, now)
            .unwrap_or(TTL_NO_EXPIRY)
    }

    /// All distinct keys that match the pattern, in lexicographic order.
    ///
    /// Expired keys that haven't been purged yet are skipped.
    pub fn keys(&self, pattern: &KeyPattern, now: ExpirationTimeType) -> Vec<StorageKey> {
        self.all_keys()
            .into_iter()
            .filter(|key| !self.expiry.is_expired(key, now) && pattern.matches(key))
            .map(str::to_string)
            .collect()
    }

    /// Number of distinct keys across all namespaces
    pub fn len(&self) -> usize {
        self.all_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.contains_any()
    }

    /// Purges every key whose expiration time has passed. Returns the number purged.
    pub fn sweep_expired(&mut self, now: ExpirationTimeType) -> usize {
        let expired = self.expiry.expired_keys(now);
        let count = expired.len();
        for key in expired {
            self.remove(&key);
        }
        count
    }

    /// Drops the expiration time of a key whose last data was just removed.
    fn forget_if_gone(&mut self, key: &str) {
        if !self.contains(key) {
            self.expiry.remove(key);
        }
    }

    /// Whether the key holds data in a namespace other than the scalar one
    fn held_by_collection(&self, key: &str) -> bool {
        self.hashes.contains_key(key)
            || self.lists.contains_key(key)
            || self.sets.contains_key(key)
            || self.zsets.contains_key(key)
    }

    fn contains_any(&self) -> bool {
        !(self.scalars.is_empty()
            && self.hashes.is_empty()
            && self.lists.is_empty()
            && self.sets.is_empty()
            && self.zsets.is_empty())
    }

    fn all_keys(&self) -> BTreeSet<&str> {
        self.scalars
            .keys()
            .chain(self.hashes.keys())
            .chain(self.lists.keys())
            .chain(self.sets.keys())
            .chain(self.zsets.keys())
            .map(String::as_str)
            .collect()
    }
}
