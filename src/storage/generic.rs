//! Generic Storage For Gamification Features - Data Abstraction Layer (DAL)
//!
//! Feature modules (points, streaks, quests, badges, leaderboards) talk to the store only
//! through the [`Storage`] trait, so any backend implementing it is a drop-in substitute
//! for the in-memory [reference engine](crate::storage::MemoryStore).

use crate::batch::{run_batch, Multi};
use crate::cmd::{Command, Reply};
use crate::errors::StoreError;
use crate::types::{ScoredMember, StorageKey, Value};
use std::collections::HashMap;

/// Trait: the storage contract
///
/// Every conforming backend validates its inputs the same way before touching any state:
/// - keys and hash field names must be non-empty,
/// - scores and score increments must be finite numbers; `zcount` bounds may be infinite,
/// - TTLs given to [`set`](Storage::set) and [`expire`](Storage::expire) must not be negative.
///
/// Operations invoked before [`connect`](Storage::connect) or after
/// [`disconnect`](Storage::disconnect) fail with [`StoreError::NotConnected`].
///
/// Each single operation is atomic with respect to all other operations on the same key.
/// Batches ([`transaction`](Storage::transaction), [`multi`](Storage::multi)) are not:
/// they run their commands one at a time and are never rolled back.
pub trait Storage: Send + Sync {
    // Lifecycle

    /// Opens the store. Connecting an open store is a no-op.
    fn connect(&self) -> Result<(), StoreError>;

    /// Closes the store and releases its resources. Disconnecting a closed store is a no-op.
    fn disconnect(&self) -> Result<(), StoreError>;

    /// Health check
    fn ping(&self) -> Result<(), StoreError>;

    // Keys and expiry

    /// Removes the key from every data type. Returns `true` if it held any data.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Whether the key holds any data
    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Sets the key to expire after `seconds`; zero expires it at once.
    ///
    /// Returns `false`, and sets nothing, if the key doesn't exist.
    fn expire(&self, key: &str, seconds: i64) -> Result<bool, StoreError>;

    /// Removes the key's expiration time. Returns `true` if it had one.
    fn persist(&self, key: &str) -> Result<bool, StoreError>;

    /// Remaining whole seconds to live; -1 if the key never expires, -2 if it doesn't exist.
    fn ttl(&self, key: &str) -> Result<i64, StoreError>;

    /// Keys matching a glob pattern (`*` and `?` wildcards), in lexicographic order.
    fn keys(&self, pattern: &str) -> Result<Vec<StorageKey>, StoreError>;

    /// Deletes every key matching a glob pattern. Returns how many were deleted.
    fn clear(&self, pattern: &str) -> Result<usize, StoreError>;

    /// Number of live keys
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    // Scalars

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Sets the value, with an optional TTL in seconds applied together with the write.
    ///
    /// Without a TTL, a previous expiration time is discarded unless the key also holds
    /// a collection, which keeps its window.
    fn set(&self, key: &str, value: Value, ttl: Option<i64>) -> Result<(), StoreError>;

    /// Sets the value with a TTL; `seconds <= 0` leaves the key already expired.
    fn setex(&self, key: &str, seconds: i64, value: Value) -> Result<(), StoreError>;

    /// Adds `amount` to the integer reading of the value (absent counts as 0), keeping
    /// the key's expiration time. Returns the new value.
    fn increment(&self, key: &str, amount: i64) -> Result<i64, StoreError>;

    /// Subtracts `amount`, see [`increment`](Storage::increment).
    fn decrement(&self, key: &str, amount: i64) -> Result<i64, StoreError>;

    /// Values of several keys; absent keys map to `None`.
    fn mget(&self, keys: &[&str]) -> Result<HashMap<StorageKey, Option<Value>>, StoreError>;

    /// Sets several keys one after the other; not atomic as a unit.
    fn mset(&self, entries: Vec<(StorageKey, Value)>) -> Result<(), StoreError>;

    // Hashes

    /// Returns `true` if the field is new.
    fn hset(&self, key: &str, field: &str, value: Value) -> Result<bool, StoreError>;

    fn hget(&self, key: &str, field: &str) -> Result<Option<Value>, StoreError>;

    /// Empty for an absent key.
    fn hgetall(&self, key: &str) -> Result<HashMap<String, Value>, StoreError>;

    fn hmset(&self, key: &str, fields: Vec<(String, Value)>) -> Result<(), StoreError>;

    fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Value>>, StoreError>;

    fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Returns how many of the fields were removed.
    fn hdel(&self, key: &str, fields: &[&str]) -> Result<usize, StoreError>;

    /// Fails with a type conflict if the field holds a non-integer value.
    fn hincrby(&self, key: &str, field: &str, increment: i64) -> Result<i64, StoreError>;

    fn hlen(&self, key: &str) -> Result<usize, StoreError>;

    // Sets

    /// Returns how many members weren't already present.
    fn sadd(&self, key: &str, members: &[&str]) -> Result<usize, StoreError>;

    fn srem(&self, key: &str, members: &[&str]) -> Result<usize, StoreError>;

    fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError>;

    fn sismember(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    fn scard(&self, key: &str) -> Result<usize, StoreError>;

    // Lists

    /// Prepends values one by one, so `lpush(k, [a, b, c])` stores `[c, b, a]`.
    fn lpush(&self, key: &str, values: Vec<Value>) -> Result<usize, StoreError>;

    fn rpush(&self, key: &str, values: Vec<Value>) -> Result<usize, StoreError>;

    fn lpop(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn rpop(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Inclusive positions; negative positions count from the end.
    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Value>, StoreError>;

    fn llen(&self, key: &str) -> Result<usize, StoreError>;

    /// Removes `count` matches from the head (`count > 0`), from the tail (`count < 0`),
    /// or all matches (`count == 0`).
    fn lrem(&self, key: &str, count: i64, value: &Value) -> Result<usize, StoreError>;

    // Sorted sets

    /// Returns 1 if the member is new, 0 if only its score changed.
    fn zadd(&self, key: &str, score: f64, member: &str) -> Result<usize, StoreError> {
        self.zadd_multi(key, &[(member, score)])
    }

    /// Bulk form of [`zadd`](Storage::zadd); returns how many members are new.
    fn zadd_multi(&self, key: &str, members: &[(&str, f64)]) -> Result<usize, StoreError>;

    /// Returns the new score; an absent member starts from 0.
    fn zincrby(&self, key: &str, increment: f64, member: &str) -> Result<f64, StoreError>;

    fn zrem(&self, key: &str, members: &[&str]) -> Result<usize, StoreError>;

    fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError>;

    fn zcard(&self, key: &str) -> Result<usize, StoreError>;

    /// Members by ascending score; ties by insertion order.
    fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        Ok(members_only(self.zrange_withscores(key, start, stop)?))
    }

    fn zrange_withscores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<ScoredMember>, StoreError>;

    /// Members by descending score; ties by insertion order.
    fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        Ok(members_only(self.zrevrange_withscores(key, start, stop)?))
    }

    fn zrevrange_withscores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<ScoredMember>, StoreError>;

    /// Zero-based ascending position, or `None` if the member is absent.
    fn zrank(&self, key: &str, member: &str) -> Result<Option<usize>, StoreError>;

    /// Zero-based descending position, or `None` if the member is absent.
    fn zrevrank(&self, key: &str, member: &str) -> Result<Option<usize>, StoreError>;

    /// Members with `min <= score <= max`; pass infinities for unbounded ends.
    fn zcount(&self, key: &str, min: f64, max: f64) -> Result<usize, StoreError>;

    // Batches

    /// Runs the commands in order and returns their replies.
    ///
    /// Stops at the first failing command and returns its error. Commands that ran before
    /// it stay applied: there is no rollback. Other callers may interleave between commands.
    fn transaction(&self, commands: &[Command]) -> Result<Vec<Reply>, StoreError> {
        run_batch(self, commands)
    }

    /// Starts a chained batch, see [`Multi`].
    fn multi(&self) -> Multi<'_, Self>
    where
        Self: Sized,
    {
        Multi::new(self)
    }
}

fn members_only(scored: Vec<ScoredMember>) -> Vec<String> {
    scored.into_iter().map(|m| m.member).collect()
}
