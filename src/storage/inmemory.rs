//! In-memory (not-persistent) implementation of the [`Storage`] contract
//!
//! All state lives in a [`Keyspace`] behind a single [`RwLock`](std::sync::RwLock), which
//! serializes every operation against every other. Reads share the lock; an operation that
//! finds its key expired upgrades to the write lock to purge it.
//!
//! The state exists only between [`connect`](Storage::connect) and
//! [`disconnect`](Storage::disconnect); disconnecting discards it.

use crate::constants::HZ_MS;
use crate::errors::{
    check_field, check_finite, check_key, check_non_negative, check_not_nan, StoreError,
};
use crate::expiry::{deadline_after_secs, now_ms, Sweeper};
use crate::pattern::KeyPattern;
use crate::storage::keyspace::Keyspace;
use crate::storage::Storage;
use crate::types::{ConcurrentStorageType, ScoredMember, StorageKey, Value};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// Configuration of the in-memory engine
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Period of the active expiry sweep; `None` disables it, leaving only lazy expiry.
    pub sweep_interval: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Some(Duration::from_millis(HZ_MS as u64)),
        }
    }
}

impl StoreConfig {
    /// No background sweep; meant for tests and short-lived hosts.
    pub fn ephemeral() -> Self {
        Self {
            sweep_interval: None,
        }
    }

    pub fn with_sweep_interval(interval: Duration) -> Self {
        Self {
            sweep_interval: Some(interval),
        }
    }
}

/// The in-memory reference engine
///
/// Independent instances don't share any state.
#[derive(Debug)]
pub struct MemoryStore {
    storage: ConcurrentStorageType,
    sweeper: Mutex<Option<Sweeper>>,
    config: StoreConfig,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl MemoryStore {
    /// Creates a disconnected store
    pub fn new(config: StoreConfig) -> Self {
        Self {
            storage: Arc::new(RwLock::new(None)),
            sweeper: Mutex::new(None),
            config,
        }
    }

    /// Creates a store and connects it
    pub fn connected(config: StoreConfig) -> Result<Self, StoreError> {
        let store = Self::new(config);
        store.connect()?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Runs a read-only operation on a single key.
    ///
    /// If the key has expired, the operation runs under the write lock after purging it,
    /// so it observes the key as absent.
    fn read_key<T>(&self, key: &str, op: impl FnOnce(&Keyspace) -> T) -> Result<T, StoreError> {
        check_key(key)?;
        {
            let guard = self.storage.read().map_err(|_| StoreError::Poisoned)?;
            let keyspace = guard.as_ref().ok_or(StoreError::NotConnected)?;
            if !keyspace.is_expired(key, now_ms()) {
                return Ok(op(keyspace));
            }
        }
        self.write_key(key, |keyspace| Ok(op(&*keyspace)))
    }

    /// Runs a mutating operation on a single key, after purging the key if it has expired.
    fn write_key<T>(
        &self,
        key: &str,
        op: impl FnOnce(&mut Keyspace) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        check_key(key)?;
        self.write_all(|keyspace| {
            keyspace.remove_if_expired(key, now_ms());
            op(keyspace)
        })
    }

    /// Runs an operation on the whole keyspace under the write lock.
    fn write_all<T>(
        &self,
        op: impl FnOnce(&mut Keyspace) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.storage.write().map_err(|_| StoreError::Poisoned)?;
        let keyspace = guard.as_mut().ok_or(StoreError::NotConnected)?;
        op(keyspace)
    }
}

impl Storage for MemoryStore {
    fn connect(&self) -> Result<(), StoreError> {
        {
            let mut guard = self.storage.write().map_err(|_| StoreError::Poisoned)?;
            if guard.is_some() {
                debug!("Already connected");
                return Ok(());
            }
            *guard = Some(Keyspace::new());
        }

        if let Some(interval) = self.config.sweep_interval {
            match Sweeper::spawn(Arc::clone(&self.storage), interval) {
                Ok(sweeper) => {
                    *self.sweeper.lock().map_err(|_| StoreError::Poisoned)? = Some(sweeper);
                }
                Err(e) => {
                    // Leave the store disconnected rather than without active expiry.
                    *self.storage.write().map_err(|_| StoreError::Poisoned)? = None;
                    return Err(e);
                }
            }
        }

        debug!("Connected");
        Ok(())
    }

    fn disconnect(&self) -> Result<(), StoreError> {
        // Stop the sweeper first; it may be waiting for the storage lock.
        let sweeper = self
            .sweeper
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .take();
        if let Some(sweeper) = sweeper {
            sweeper.stop();
        }

        let mut guard = self.storage.write().map_err(|_| StoreError::Poisoned)?;
        if let Some(keyspace) = guard.take() {
            debug!("Disconnected, discarded {} key(s)", keyspace.len());
        }
        Ok(())
    }

    fn ping(&self) -> Result<(), StoreError> {
        let guard = self.storage.read().map_err(|_| StoreError::Poisoned)?;
        guard.as_ref().map(|_| ()).ok_or(StoreError::NotConnected)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.write_key(key, |ks| Ok(ks.remove(key)))
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.read_key(key, |ks| ks.contains(key))
    }

    fn expire(&self, key: &str, seconds: i64) -> Result<bool, StoreError> {
        check_non_negative("seconds", seconds)?;
        self.write_key(key, |ks| {
            Ok(ks.expire(key, deadline_after_secs(now_ms(), seconds)))
        })
    }

    fn persist(&self, key: &str) -> Result<bool, StoreError> {
        self.write_key(key, |ks| Ok(ks.persist(key)))
    }

    fn ttl(&self, key: &str) -> Result<i64, StoreError> {
        self.read_key(key, |ks| ks.ttl(key, now_ms()))
    }

    fn keys(&self, pattern: &str) -> Result<Vec<StorageKey>, StoreError> {
        let pattern = KeyPattern::new(pattern)?;
        let guard = self.storage.read().map_err(|_| StoreError::Poisoned)?;
        let keyspace = guard.as_ref().ok_or(StoreError::NotConnected)?;
        Ok(keyspace.keys(&pattern, now_ms()))
    }

    fn clear(&self, pattern: &str) -> Result<usize, StoreError> {
        let pattern = KeyPattern::new(pattern)?;
        self.write_all(|ks| {
            let now = now_ms();
            ks.sweep_expired(now);
            let doomed = ks.keys(&pattern, now);
            for key in &doomed {
                ks.remove(key);
            }
            debug!("Cleared {} key(s)", doomed.len());
            Ok(doomed.len())
        })
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.write_all(|ks| {
            ks.sweep_expired(now_ms());
            Ok(ks.len())
        })
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.read_key(key, |ks| ks.get(key))
    }

    fn set(&self, key: &str, value: Value, ttl: Option<i64>) -> Result<(), StoreError> {
        if let Some(seconds) = ttl {
            check_non_negative("ttl", seconds)?;
        }
        self.write_key(key, |ks| {
            let deadline = ttl.map(|seconds| deadline_after_secs(now_ms(), seconds));
            ks.set(key, value, deadline);
            Ok(())
        })
    }

    fn setex(&self, key: &str, seconds: i64, value: Value) -> Result<(), StoreError> {
        self.write_key(key, |ks| {
            ks.set(key, value, Some(deadline_after_secs(now_ms(), seconds)));
            Ok(())
        })
    }

    fn increment(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        self.write_key(key, |ks| ks.incr_by(key, amount))
    }

    fn decrement(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        check_key(key)?;
        let delta = amount.checked_neg().ok_or_else(|| StoreError::Overflow {
            key: key.to_string(),
        })?;
        self.write_key(key, |ks| ks.incr_by(key, delta))
    }

    fn mget(&self, keys: &[&str]) -> Result<HashMap<StorageKey, Option<Value>>, StoreError> {
        for key in keys {
            check_key(key)?;
        }
        self.write_all(|ks| {
            let now = now_ms();
            Ok(keys
                .iter()
                .map(|&key| {
                    ks.remove_if_expired(key, now);
                    (key.to_string(), ks.get(key))
                })
                .collect())
        })
    }

    fn mset(&self, entries: Vec<(StorageKey, Value)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(&key, value, None)?;
        }
        Ok(())
    }

    fn hset(&self, key: &str, field: &str, value: Value) -> Result<bool, StoreError> {
        check_field(field)?;
        self.write_key(key, |ks| Ok(ks.hset(key, field, value)))
    }

    fn hget(&self, key: &str, field: &str) -> Result<Option<Value>, StoreError> {
        check_field(field)?;
        self.read_key(key, |ks| ks.hget(key, field))
    }

    fn hgetall(&self, key: &str) -> Result<HashMap<String, Value>, StoreError> {
        self.read_key(key, |ks| ks.hgetall(key))
    }

    fn hmset(&self, key: &str, fields: Vec<(String, Value)>) -> Result<(), StoreError> {
        for (field, _) in &fields {
            check_field(field)?;
        }
        self.write_key(key, |ks| {
            ks.hmset(key, fields);
            Ok(())
        })
    }

    fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Value>>, StoreError> {
        for field in fields {
            check_field(field)?;
        }
        self.read_key(key, |ks| ks.hmget(key, fields))
    }

    fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        check_field(field)?;
        self.read_key(key, |ks| ks.hexists(key, field))
    }

    fn hdel(&self, key: &str, fields: &[&str]) -> Result<usize, StoreError> {
        for field in fields {
            check_field(field)?;
        }
        self.write_key(key, |ks| Ok(ks.hdel(key, fields)))
    }

    fn hincrby(&self, key: &str, field: &str, increment: i64) -> Result<i64, StoreError> {
        check_field(field)?;
        self.write_key(key, |ks| ks.hincrby(key, field, increment))
    }

    fn hlen(&self, key: &str) -> Result<usize, StoreError> {
        self.read_key(key, |ks| ks.hlen(key))
    }

    fn sadd(&self, key: &str, members: &[&str]) -> Result<usize, StoreError> {
        self.write_key(key, |ks| Ok(ks.sadd(key, members)))
    }

    fn srem(&self, key: &str, members: &[&str]) -> Result<usize, StoreError> {
        self.write_key(key, |ks| Ok(ks.srem(key, members)))
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.read_key(key, |ks| ks.smembers(key))
    }

    fn sismember(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.read_key(key, |ks| ks.sismember(key, member))
    }

    fn scard(&self, key: &str) -> Result<usize, StoreError> {
        self.read_key(key, |ks| ks.scard(key))
    }

    fn lpush(&self, key: &str, values: Vec<Value>) -> Result<usize, StoreError> {
        self.write_key(key, |ks| Ok(ks.lpush(key, values)))
    }

    fn rpush(&self, key: &str, values: Vec<Value>) -> Result<usize, StoreError> {
        self.write_key(key, |ks| Ok(ks.rpush(key, values)))
    }

    fn lpop(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.write_key(key, |ks| Ok(ks.lpop(key)))
    }

    fn rpop(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.write_key(key, |ks| Ok(ks.rpop(key)))
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Value>, StoreError> {
        self.read_key(key, |ks| ks.lrange(key, start, stop))
    }

    fn llen(&self, key: &str) -> Result<usize, StoreError> {
        self.read_key(key, |ks| ks.llen(key))
    }

    fn lrem(&self, key: &str, count: i64, value: &Value) -> Result<usize, StoreError> {
        self.write_key(key, |ks| Ok(ks.lrem(key, count, value)))
    }

    fn zadd_multi(&self, key: &str, members: &[(&str, f64)]) -> Result<usize, StoreError> {
        for &(_, score) in members {
            check_finite("score", score)?;
        }
        self.write_key(key, |ks| Ok(ks.zadd(key, members)))
    }

    fn zincrby(&self, key: &str, increment: f64, member: &str) -> Result<f64, StoreError> {
        check_finite("increment", increment)?;
        self.write_key(key, |ks| ks.zincrby(key, increment, member))
    }

    fn zrem(&self, key: &str, members: &[&str]) -> Result<usize, StoreError> {
        self.write_key(key, |ks| Ok(ks.zrem(key, members)))
    }

    fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError> {
        self.read_key(key, |ks| ks.zscore(key, member))
    }

    fn zcard(&self, key: &str) -> Result<usize, StoreError> {
        self.read_key(key, |ks| ks.zcard(key))
    }

    fn zrange_withscores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<ScoredMember>, StoreError> {
        self.read_key(key, |ks| ks.zrange(key, start, stop))
    }

    fn zrevrange_withscores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<ScoredMember>, StoreError> {
        self.read_key(key, |ks| ks.zrevrange(key, start, stop))
    }

    fn zrank(&self, key: &str, member: &str) -> Result<Option<usize>, StoreError> {
        self.read_key(key, |ks| ks.zrank(key, member))
    }

    fn zrevrank(&self, key: &str, member: &str) -> Result<Option<usize>, StoreError> {
        self.read_key(key, |ks| ks.zrevrank(key, member))
    }

    fn zcount(&self, key: &str, min: f64, max: f64) -> Result<usize, StoreError> {
        check_not_nan("min", min)?;
        check_not_nan("max", max)?;
        self.read_key(key, |ks| ks.zcount(key, min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TTL_NO_EXPIRY;
    use std::thread;

    fn store() -> MemoryStore {
        MemoryStore::connected(StoreConfig::ephemeral()).unwrap()
    }

    #[test]
    fn operations_fail_outside_connect_bracket() {
        let store = MemoryStore::new(StoreConfig::ephemeral());
        assert_eq!(Err(StoreError::NotConnected), store.get("k"));
        assert_eq!(Err(StoreError::NotConnected), store.ping());

        store.connect().unwrap();
        store.set("k", Value::Int(1), None).unwrap();
        assert_eq!(Ok(()), store.ping());

        store.disconnect().unwrap();
        assert_eq!(Err(StoreError::NotConnected), store.get("k"));
        assert_eq!(Err(StoreError::NotConnected), store.keys("*"));
        assert_eq!(
            Err(StoreError::NotConnected),
            store.zadd("lb", 1.0, "a")
        );
    }

    #[test]
    fn disconnect_discards_state() {
        let store = store();
        store.set("k", Value::Int(1), None).unwrap();
        store.disconnect().unwrap();
        store.disconnect().unwrap();
        store.connect().unwrap();
        assert_eq!(Ok(None), store.get("k"));
        assert_eq!(Ok(0), store.len());
    }

    #[test]
    fn connect_twice_keeps_state() {
        let store = store();
        store.set("k", Value::Int(1), None).unwrap();
        store.connect().unwrap();
        assert_eq!(Ok(Some(Value::Int(1))), store.get("k"));
    }

    #[test]
    fn instances_are_independent() {
        let a = store();
        let b = store();
        a.set("k", Value::from("a"), None).unwrap();
        assert_eq!(Ok(None), b.get("k"));
    }

    #[test]
    fn round_trip() {
        let store = store();
        let values = vec![
            Value::from("text"),
            Value::Int(-3),
            Value::Float(2.5),
            Value::Bool(false),
            Value::from(serde_json::json!({"badges": ["early-bird"], "level": 4})),
        ];
        for (i, value) in values.into_iter().enumerate() {
            let key = format!("k{i}");
            store.set(&key, value.clone(), None).unwrap();
            assert_eq!(Ok(Some(value)), store.get(&key));
        }
    }

    #[test]
    fn validation_happens_before_mutation() {
        let store = store();
        assert_eq!(Err(StoreError::EmptyKey), store.set("", Value::Int(1), None));
        assert_eq!(
            Err(StoreError::EmptyField),
            store.hset("h", "", Value::Int(1))
        );
        assert_eq!(
            Err(StoreError::NonFinite { name: "score" }),
            store.zadd_multi("lb", &[("a", 1.0), ("b", f64::NAN)])
        );
        assert_eq!(
            Err(StoreError::NonFinite { name: "increment" }),
            store.zincrby("lb", f64::INFINITY, "a")
        );
        assert_eq!(
            Err(StoreError::Negative { name: "ttl" }),
            store.set("k", Value::Int(1), Some(-1))
        );
        assert_eq!(
            Err(StoreError::NotANumber { name: "min" }),
            store.zcount("lb", f64::NAN, 1.0)
        );
        assert_eq!(Ok(0), store.len());
    }

    #[test]
    fn ttl_survives_increment() {
        let store = store();
        store.set("k", Value::Int(5), None).unwrap();
        assert_eq!(Ok(true), store.expire("k", 100));
        assert_eq!(Ok(8), store.increment("k", 3));
        let ttl = store.ttl("k").unwrap();
        assert!((99..=100).contains(&ttl), "ttl was {ttl}");
        assert_eq!(Ok(Some(Value::Int(8))), store.get("k"));
    }

    #[test]
    fn ttl_survives_decrement() {
        let store = store();
        store.setex("window", 60, Value::Int(10)).unwrap();
        assert_eq!(Ok(7), store.decrement("window", 3));
        assert!(store.ttl("window").unwrap() > 0);
    }

    #[test]
    fn ttl_sentinels() {
        let store = store();
        assert_eq!(Ok(-2), store.ttl("missing"));
        store.set("k", Value::Int(1), None).unwrap();
        assert_eq!(Ok(-1), store.ttl("k"));
        store.set("k", Value::Int(1), Some(30)).unwrap();
        assert!((29..=30).contains(&store.ttl("k").unwrap()));
        assert_eq!(Ok(true), store.persist("k"));
        assert_eq!(Ok(-1), store.ttl("k"));
        assert_eq!(Ok(false), store.persist("k"));
    }

    #[test]
    fn setex_zero_expires_immediately() {
        let store = store();
        store.setex("k", 0, Value::from("v")).unwrap();
        assert_eq!(Ok(false), store.exists("k"));
        assert_eq!(Ok(None), store.get("k"));
        assert_eq!(Ok(-2), store.ttl("k"));

        store.setex("n", -10, Value::from("v")).unwrap();
        assert_eq!(Ok(false), store.exists("n"));
    }

    #[test]
    fn expire_on_missing_key_sets_nothing() {
        let store = store();
        assert_eq!(Ok(false), store.expire("ghost", 10));
        store.set("ghost", Value::Int(1), None).unwrap();
        assert_eq!(Ok(-1), store.ttl("ghost"));
    }

    #[test]
    fn expired_key_is_purged_from_every_type() {
        let store = store();
        store.set("k", Value::Int(1), None).unwrap();
        store.hset("k", "f", Value::Int(1)).unwrap();
        store.zadd("k", 1.0, "m").unwrap();
        store.expire("k", 0).unwrap();

        assert_eq!(Ok(None), store.hget("k", "f"));
        assert_eq!(Ok(0), store.zcard("k"));
        assert_eq!(Ok(false), store.exists("k"));
        // a write after expiry starts from scratch
        assert_eq!(Ok(1), store.increment("k", 1));
        assert_eq!(Ok(-1), store.ttl("k"));
    }

    #[test]
    fn active_sweep_evicts_unread_keys() {
        let store =
            MemoryStore::connected(StoreConfig::with_sweep_interval(Duration::from_millis(5)))
                .unwrap();
        store.setex("stale", 0, Value::from("v")).unwrap();
        store.set("fresh", Value::from("v"), None).unwrap();
        thread::sleep(Duration::from_millis(60));
        {
            let guard = store.storage.read().unwrap();
            let keyspace = guard.as_ref().unwrap();
            assert!(!keyspace.contains("stale"));
            assert!(keyspace.contains("fresh"));
        }
        store.disconnect().unwrap();
        assert!(store.sweeper.lock().unwrap().is_none());
    }

    #[test]
    fn rank_determinism() {
        let store = store();
        store.zadd("lb", 10.0, "a").unwrap();
        store.zadd("lb", 10.0, "b").unwrap();
        assert_eq!(Ok(vec!["a".to_string(), "b".to_string()]), store.zrevrange("lb", 0, -1));
        assert_eq!(Ok(Some(0)), store.zrank("lb", "a"));
        assert_eq!(Ok(Some(1)), store.zrank("lb", "b"));
        assert_eq!(Ok(None), store.zrank("lb", "c"));
    }

    #[test]
    fn leaderboard_top_n_with_scores() {
        let store = store();
        store.zadd("global", 700.0, "u3").unwrap();
        store.zadd("global", 500.0, "u1").unwrap();
        store.zadd("global", 600.0, "u5").unwrap();
        assert_eq!(
            Ok(vec![
                ScoredMember::new("u3", 700.0),
                ScoredMember::new("u5", 600.0),
                ScoredMember::new("u1", 500.0),
            ]),
            store.zrevrange_withscores("global", 0, 2)
        );
        assert_eq!(Ok(Some(2)), store.zrevrank("global", "u1"));
        assert_eq!(Ok(Some(600.0)), store.zscore("global", "u5"));
        assert_eq!(
            Ok(2),
            store.zcount("global", 550.0, f64::INFINITY)
        );
    }

    #[test]
    fn list_history_trail() {
        let store = store();
        store
            .lpush("k", vec![Value::from("a"), Value::from("b"), Value::from("c")])
            .unwrap();
        assert_eq!(
            Ok(vec![Value::from("c"), Value::from("b"), Value::from("a")]),
            store.lrange("k", 0, -1)
        );
        assert_eq!(
            Ok(vec![Value::from("b"), Value::from("a")]),
            store.lrange("k", -2, -1)
        );
        assert_eq!(Ok(None), store.lpop("empty"));
    }

    #[test]
    fn pattern_escaping() {
        let store = store();
        store.set("user.name", Value::Int(1), None).unwrap();
        store.set("user1", Value::Int(1), None).unwrap();
        assert_eq!(Ok(vec!["user.name".to_string()]), store.keys("user.name"));
        assert_eq!(Ok(Vec::<String>::new()), store.keys("userXname"));
        assert_eq!(
            Ok(vec!["user.name".to_string(), "user1".to_string()]),
            store.keys("user*")
        );
    }

    #[test]
    fn clear_by_pattern() {
        let store = store();
        store.set("cache:lb:weekly", Value::Int(1), None).unwrap();
        store.hset("cache:user:1", "f", Value::Int(1)).unwrap();
        store.set("points:1", Value::Int(1), None).unwrap();
        assert_eq!(Ok(2), store.clear("cache:*"));
        assert_eq!(Ok(vec!["points:1".to_string()]), store.keys("*"));
        assert_eq!(Ok(0), store.clear("cache:*"));
    }

    #[test]
    fn mget_maps_absent_keys_to_none() {
        let store = store();
        store
            .mset(vec![
                ("a".to_string(), Value::Int(1)),
                ("b".to_string(), Value::Int(2)),
            ])
            .unwrap();
        let values = store.mget(&["a", "b", "c"]).unwrap();
        assert_eq!(3, values.len());
        assert_eq!(Some(&Some(Value::Int(1))), values.get("a"));
        assert_eq!(Some(&None), values.get("c"));
    }

    #[test]
    fn mset_is_best_effort() {
        let store = store();
        let result = store.mset(vec![
            ("a".to_string(), Value::Int(1)),
            (String::new(), Value::Int(2)),
            ("c".to_string(), Value::Int(3)),
        ]);
        assert_eq!(Err(StoreError::EmptyKey), result);
        assert_eq!(Ok(Some(Value::Int(1))), store.get("a"));
        assert_eq!(Ok(None), store.get("c"));
    }

    #[test]
    fn atomic_counters_under_concurrency() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;

        let store = store();
        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..PER_THREAD {
                        store.increment("counter", 1).unwrap();
                        store.hincrby("user:1", "points", 2).unwrap();
                        store.zincrby("lb", 1.0, "u1").unwrap();
                    }
                });
            }
        });

        let n = (THREADS * PER_THREAD) as i64;
        assert_eq!(Ok(Some(Value::Int(n))), store.get("counter"));
        assert_eq!(Ok(Some(Value::Int(2 * n))), store.hget("user:1", "points"));
        assert_eq!(Ok(Some(n as f64)), store.zscore("lb", "u1"));
    }

    #[test]
    fn unlock_once_under_concurrency() {
        let store = store();
        let unlocked: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| store.sadd("tiers:u1", &["gold"]).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(1, unlocked);
        assert_eq!(Ok(vec!["gold".to_string()]), store.smembers("tiers:u1"));
    }

    #[test]
    fn types_coexist_under_one_key() {
        let store = store();
        store.set("user:1", Value::from("profile"), None).unwrap();
        store.hset("user:1", "xp", Value::Int(10)).unwrap();
        store.sadd("user:1", &["badge"]).unwrap();
        store.rpush("user:1", vec![Value::from("login")]).unwrap();
        store.zadd("user:1", 1.0, "streak").unwrap();

        assert_eq!(Ok(vec!["user:1".to_string()]), store.keys("*"));
        assert_eq!(Ok(1), store.len());
        assert_eq!(Ok(Some(Value::from("profile"))), store.get("user:1"));
        assert_eq!(Ok(1), store.llen("user:1"));

        assert_eq!(Ok(true), store.delete("user:1"));
        assert_eq!(Ok(0), store.scard("user:1"));
        assert_eq!(Ok(false), store.delete("user:1"));
    }

    #[test]
    fn hincrby_type_conflict() {
        let store = store();
        store.hset("h", "name", Value::from("Ada")).unwrap();
        assert!(matches!(
            store.hincrby("h", "name", 1),
            Err(StoreError::FieldNotAnInteger { .. })
        ));
        assert_eq!(Ok(5), store.hincrby("h", "points", 5));
    }

    #[test]
    fn emptied_collection_recreated_without_old_expiry() {
        let store = store();

        store.hset("h", "f", Value::Int(1)).unwrap();
        store.expire("h", 100).unwrap();
        store.hdel("h", &["f"]).unwrap();
        store.hset("h", "f", Value::Int(2)).unwrap();
        assert_eq!(Ok(TTL_NO_EXPIRY), store.ttl("h"));

        store.rpush("l", vec![Value::from("a")]).unwrap();
        store.expire("l", 1).unwrap();
        store.lpop("l").unwrap();
        store.rpush("l", vec![Value::from("b")]).unwrap();
        assert_eq!(Ok(TTL_NO_EXPIRY), store.ttl("l"));

        store.sadd("s", &["a"]).unwrap();
        store.expire("s", 100).unwrap();
        store.srem("s", &["a"]).unwrap();
        store.sadd("s", &["b"]).unwrap();
        assert_eq!(Ok(TTL_NO_EXPIRY), store.ttl("s"));

        store.zadd("z", 1.0, "a").unwrap();
        store.expire("z", 100).unwrap();
        store.zrem("z", &["a"]).unwrap();
        store.zadd("z", 1.0, "b").unwrap();
        assert_eq!(Ok(TTL_NO_EXPIRY), store.ttl("z"));
    }

    #[test]
    fn plain_scalar_write_keeps_collection_ttl() {
        let store = store();
        store.hset("k", "f", Value::Int(1)).unwrap();
        store.expire("k", 100).unwrap();

        store.set("k", Value::Int(1), None).unwrap();
        let ttl = store.ttl("k").unwrap();
        assert!((99..=100).contains(&ttl), "ttl was {ttl}");
        assert_eq!(Ok(Some(Value::Int(1))), store.hget("k", "f"));

        store.hdel("k", &["f"]).unwrap();
        store.set("k", Value::Int(2), None).unwrap();
        assert_eq!(Ok(TTL_NO_EXPIRY), store.ttl("k"));
    }

    #[test]
    fn decrement_validates_key_first() {
        let store = store();
        assert_eq!(Err(StoreError::EmptyKey), store.decrement("", i64::MIN));
        assert!(matches!(
            store.decrement("k", i64::MIN),
            Err(StoreError::Overflow { .. })
        ));
    }
}
