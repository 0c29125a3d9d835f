//! # Constants
//!
//! Constants used throughout the application

use crate::types::ExpirationTimeType;

/// Time period in milliseconds between two active sweeps of expired keys
pub const HZ_MS: ExpirationTimeType = 100;

/// [`ttl`](crate::storage::Storage::ttl) reply for a key that exists but has no expiry set
pub const TTL_NO_EXPIRY: i64 = -1;
/// [`ttl`](crate::storage::Storage::ttl) reply for a key that doesn't exist
pub const TTL_MISSING_KEY: i64 = -2;

/// Milliseconds in a second
pub const MS_PER_SEC: ExpirationTimeType = 1000;

/// Supported commands, as understood by [`crate::cmd::Command::parse`]
pub const COMMANDS: [&str; 48] = [
    "PING", "GET", "SET", "SETEX", "DEL", "EXISTS", "EXPIRE", "PERSIST", "TTL", "INCRBY", "INCR",
    "DECRBY", "DECR", "MGET", "MSET", "HSET", "HGET", "HGETALL", "HMSET", "HMGET", "HEXISTS",
    "HDEL", "HINCRBY", "HLEN", "SADD", "SREM", "SMEMBERS", "SISMEMBER", "SCARD", "LPUSH", "RPUSH",
    "LPOP", "RPOP", "LRANGE", "LLEN", "LREM", "ZADD", "ZINCRBY", "ZREM", "ZSCORE", "ZCARD",
    "ZRANGE", "ZREVRANGE", "ZRANK", "ZREVRANK", "ZCOUNT", "KEYS", "CLEAR",
];

/// Console prompt
pub const PROMPT: &str = "gamestore> ";

/// Application exit codes
#[derive(Debug)]
pub enum ExitCode {
    Ok = 0,
    Shutdown = -1,
}
