//! # Commands and Replies
//!
//! A [`Command`] is a named store operation together with its arguments, so that operations
//! can be queued, logged and executed later, one at a time, by the
//! [batch executor](crate::batch). Every command maps onto exactly one
//! [`Storage`] method, and its result is wrapped in a [`Reply`].
//!
//! Commands can also be parsed from words, as typed into the [console](crate::console):
//! - command names are case-insensitive,
//! - `ZADD key score member [score member ...]` takes pairs, as do `MSET` and `HMSET`,
//! - `ZRANGE` and `ZREVRANGE` take an optional trailing `WITHSCORES`,
//! - `ZCOUNT` bounds accept `-inf` and `+inf`,
//! - `SET key value [EX seconds]`.

use crate::errors::{CmdError, StoreError};
use crate::storage::Storage;
use crate::types::{ScoredMember, StorageKey, Value};
use std::collections::HashMap;
use std::fmt;

/// A store operation with its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping,
    Get { key: StorageKey },
    Set { key: StorageKey, value: Value, ttl: Option<i64> },
    Setex { key: StorageKey, seconds: i64, value: Value },
    Delete { key: StorageKey },
    Exists { key: StorageKey },
    Expire { key: StorageKey, seconds: i64 },
    Persist { key: StorageKey },
    Ttl { key: StorageKey },
    Increment { key: StorageKey, amount: i64 },
    Decrement { key: StorageKey, amount: i64 },
    Mget { keys: Vec<StorageKey> },
    Mset { entries: Vec<(StorageKey, Value)> },
    Hset { key: StorageKey, field: String, value: Value },
    Hget { key: StorageKey, field: String },
    Hgetall { key: StorageKey },
    Hmset { key: StorageKey, fields: Vec<(String, Value)> },
    Hmget { key: StorageKey, fields: Vec<String> },
    Hexists { key: StorageKey, field: String },
    Hdel { key: StorageKey, fields: Vec<String> },
    Hincrby { key: StorageKey, field: String, increment: i64 },
    Hlen { key: StorageKey },
    Sadd { key: StorageKey, members: Vec<String> },
    Srem { key: StorageKey, members: Vec<String> },
    Smembers { key: StorageKey },
    Sismember { key: StorageKey, member: String },
    Scard { key: StorageKey },
    Lpush { key: StorageKey, values: Vec<Value> },
    Rpush { key: StorageKey, values: Vec<Value> },
    Lpop { key: StorageKey },
    Rpop { key: StorageKey },
    Lrange { key: StorageKey, start: i64, stop: i64 },
    Llen { key: StorageKey },
    Lrem { key: StorageKey, count: i64, value: Value },
    Zadd { key: StorageKey, members: Vec<(String, f64)> },
    Zincrby { key: StorageKey, increment: f64, member: String },
    Zrem { key: StorageKey, members: Vec<String> },
    Zscore { key: StorageKey, member: String },
    Zcard { key: StorageKey },
    Zrange { key: StorageKey, start: i64, stop: i64, with_scores: bool },
    Zrevrange { key: StorageKey, start: i64, stop: i64, with_scores: bool },
    Zrank { key: StorageKey, member: String },
    Zrevrank { key: StorageKey, member: String },
    Zcount { key: StorageKey, min: f64, max: f64 },
    Keys { pattern: String },
    Clear { pattern: String },
}

/// The result of a single [`Command`]
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Bool(bool),
    Integer(i64),
    /// A single value, or nothing
    Value(Option<Value>),
    /// Values in request order, or nothing for each absent one
    Values(Vec<Option<Value>>),
    /// List elements
    List(Vec<Value>),
    /// Key names, set members or sorted-set members
    Members(Vec<String>),
    Scored(Vec<ScoredMember>),
    Score(Option<f64>),
    Rank(Option<usize>),
    /// Hash fields
    Fields(HashMap<String, Value>),
    /// Key → value, `None` for absent keys
    Entries(HashMap<StorageKey, Option<Value>>),
}

impl Command {
    /// The operation name, as accepted by [`Command::parse`]
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::Setex { .. } => "SETEX",
            Command::Delete { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::Expire { .. } => "EXPIRE",
            Command::Persist { .. } => "PERSIST",
            Command::Ttl { .. } => "TTL",
            Command::Increment { .. } => "INCRBY",
            Command::Decrement { .. } => "DECRBY",
            Command::Mget { .. } => "MGET",
            Command::Mset { .. } => "MSET",
            Command::Hset { .. } => "HSET",
            Command::Hget { .. } => "HGET",
            Command::Hgetall { .. } => "HGETALL",
            Command::Hmset { .. } => "HMSET",
            Command::Hmget { .. } => "HMGET",
            Command::Hexists { .. } => "HEXISTS",
            Command::Hdel { .. } => "HDEL",
            Command::Hincrby { .. } => "HINCRBY",
            Command::Hlen { .. } => "HLEN",
            Command::Sadd { .. } => "SADD",
            Command::Srem { .. } => "SREM",
            Command::Smembers { .. } => "SMEMBERS",
            Command::Sismember { .. } => "SISMEMBER",
            Command::Scard { .. } => "SCARD",
            Command::Lpush { .. } => "LPUSH",
            Command::Rpush { .. } => "RPUSH",
            Command::Lpop { .. } => "LPOP",
            Command::Rpop { .. } => "RPOP",
            Command::Lrange { .. } => "LRANGE",
            Command::Llen { .. } => "LLEN",
            Command::Lrem { .. } => "LREM",
            Command::Zadd { .. } => "ZADD",
            Command::Zincrby { .. } => "ZINCRBY",
            Command::Zrem { .. } => "ZREM",
            Command::Zscore { .. } => "ZSCORE",
            Command::Zcard { .. } => "ZCARD",
            Command::Zrange { .. } => "ZRANGE",
            Command::Zrevrange { .. } => "ZREVRANGE",
            Command::Zrank { .. } => "ZRANK",
            Command::Zrevrank { .. } => "ZREVRANK",
            Command::Zcount { .. } => "ZCOUNT",
            Command::Keys { .. } => "KEYS",
            Command::Clear { .. } => "CLEAR",
        }
    }

    /// Runs the command against a store.
    pub fn apply<S: Storage + ?Sized>(&self, store: &S) -> Result<Reply, StoreError> {
        let reply = match self {
            Command::Ping => {
                store.ping()?;
                Reply::Ok
            }
            Command::Get { key } => Reply::Value(store.get(key)?),
            Command::Set { key, value, ttl } => {
                store.set(key, value.clone(), *ttl)?;
                Reply::Ok
            }
            Command::Setex {
                key,
                seconds,
                value,
            } => {
                store.setex(key, *seconds, value.clone())?;
                Reply::Ok
            }
            Command::Delete { key } => Reply::Bool(store.delete(key)?),
            Command::Exists { key } => Reply::Bool(store.exists(key)?),
            Command::Expire { key, seconds } => Reply::Bool(store.expire(key, *seconds)?),
            Command::Persist { key } => Reply::Bool(store.persist(key)?),
            Command::Ttl { key } => Reply::Integer(store.ttl(key)?),
            Command::Increment { key, amount } => Reply::Integer(store.increment(key, *amount)?),
            Command::Decrement { key, amount } => Reply::Integer(store.decrement(key, *amount)?),
            Command::Mget { keys } => Reply::Entries(store.mget(&as_strs(keys))?),
            Command::Mset { entries } => {
                store.mset(entries.clone())?;
                Reply::Ok
            }
            Command::Hset { key, field, value } => {
                Reply::Bool(store.hset(key, field, value.clone())?)
            }
            Command::Hget { key, field } => Reply::Value(store.hget(key, field)?),
            Command::Hgetall { key } => Reply::Fields(store.hgetall(key)?),
            Command::Hmset { key, fields } => {
                store.hmset(key, fields.clone())?;
                Reply::Ok
            }
            Command::Hmget { key, fields } => Reply::Values(store.hmget(key, &as_strs(fields))?),
            Command::Hexists { key, field } => Reply::Bool(store.hexists(key, field)?),
            Command::Hdel { key, fields } => count(store.hdel(key, &as_strs(fields))?),
            Command::Hincrby {
                key,
                field,
                increment,
            } => Reply::Integer(store.hincrby(key, field, *increment)?),
            Command::Hlen { key } => count(store.hlen(key)?),
            Command::Sadd { key, members } => count(store.sadd(key, &as_strs(members))?),
            Command::Srem { key, members } => count(store.srem(key, &as_strs(members))?),
            Command::Smembers { key } => Reply::Members(store.smembers(key)?),
            Command::Sismember { key, member } => Reply::Bool(store.sismember(key, member)?),
            Command::Scard { key } => count(store.scard(key)?),
            Command::Lpush { key, values } => count(store.lpush(key, values.clone())?),
            Command::Rpush { key, values } => count(store.rpush(key, values.clone())?),
            Command::Lpop { key } => Reply::Value(store.lpop(key)?),
            Command::Rpop { key } => Reply::Value(store.rpop(key)?),
            Command::Lrange { key, start, stop } => {
                Reply::List(store.lrange(key, *start, *stop)?)
            }
            Command::Llen { key } => count(store.llen(key)?),
            Command::Lrem { key, count: n, value } => count(store.lrem(key, *n, value)?),
            Command::Zadd { key, members } => {
                let pairs: Vec<(&str, f64)> = members
                    .iter()
                    .map(|(member, score)| (member.as_str(), *score))
                    .collect();
                count(store.zadd_multi(key, &pairs)?)
            }
            Command::Zincrby {
                key,
                increment,
                member,
            } => Reply::Score(Some(store.zincrby(key, *increment, member)?)),
            Command::Zrem { key, members } => count(store.zrem(key, &as_strs(members))?),
            Command::Zscore { key, member } => Reply::Score(store.zscore(key, member)?),
            Command::Zcard { key } => count(store.zcard(key)?),
            Command::Zrange {
                key,
                start,
                stop,
                with_scores,
            } => {
                if *with_scores {
                    Reply::Scored(store.zrange_withscores(key, *start, *stop)?)
                } else {
                    Reply::Members(store.zrange(key, *start, *stop)?)
                }
            }
            Command::Zrevrange {
                key,
                start,
                stop,
                with_scores,
            } => {
                if *with_scores {
                    Reply::Scored(store.zrevrange_withscores(key, *start, *stop)?)
                } else {
                    Reply::Members(store.zrevrange(key, *start, *stop)?)
                }
            }
            Command::Zrank { key, member } => Reply::Rank(store.zrank(key, member)?),
            Command::Zrevrank { key, member } => Reply::Rank(store.zrevrank(key, member)?),
            Command::Zcount { key, min, max } => count(store.zcount(key, *min, *max)?),
            Command::Keys { pattern } => Reply::Members(store.keys(pattern)?),
            Command::Clear { pattern } => count(store.clear(pattern)?),
        };
        Ok(reply)
    }

    /// Parses a command from its words: the command name followed by its arguments.
    ///
    /// Values are taken as strings; numeric arguments must parse as numbers.
    pub fn parse(words: &[String]) -> Result<Command, CmdError> {
        let (first, args) = words
            .split_first()
            .ok_or_else(|| CmdError::Syntax("empty command".to_string()))?;
        let name = first.to_ascii_uppercase();
        let arity = |ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(CmdError::WrongArity(name.clone()))
            }
        };

        let cmd = match name.as_str() {
            "PING" => {
                arity(args.is_empty())?;
                Command::Ping
            }
            "GET" => {
                arity(args.len() == 1)?;
                Command::Get {
                    key: args[0].clone(),
                }
            }
            "SET" => {
                arity(args.len() == 2 || args.len() == 4)?;
                let ttl = if args.len() == 4 {
                    if !args[2].eq_ignore_ascii_case("EX") {
                        return Err(CmdError::Syntax(format!("expected EX, got {}", args[2])));
                    }
                    Some(parse_int(&args[3])?)
                } else {
                    None
                };
                Command::Set {
                    key: args[0].clone(),
                    value: Value::from(args[1].as_str()),
                    ttl,
                }
            }
            "SETEX" => {
                arity(args.len() == 3)?;
                Command::Setex {
                    key: args[0].clone(),
                    seconds: parse_int(&args[1])?,
                    value: Value::from(args[2].as_str()),
                }
            }
            "DEL" => {
                arity(args.len() == 1)?;
                Command::Delete {
                    key: args[0].clone(),
                }
            }
            "EXISTS" => {
                arity(args.len() == 1)?;
                Command::Exists {
                    key: args[0].clone(),
                }
            }
            "EXPIRE" => {
                arity(args.len() == 2)?;
                Command::Expire {
                    key: args[0].clone(),
                    seconds: parse_int(&args[1])?,
                }
            }
            "PERSIST" => {
                arity(args.len() == 1)?;
                Command::Persist {
                    key: args[0].clone(),
                }
            }
            "TTL" => {
                arity(args.len() == 1)?;
                Command::Ttl {
                    key: args[0].clone(),
                }
            }
            "INCR" | "DECR" => {
                arity(args.len() == 1)?;
                let key = args[0].clone();
                if name == "INCR" {
                    Command::Increment { key, amount: 1 }
                } else {
                    Command::Decrement { key, amount: 1 }
                }
            }
            "INCRBY" | "DECRBY" => {
                arity(args.len() == 2)?;
                let key = args[0].clone();
                let amount = parse_int(&args[1])?;
                if name == "INCRBY" {
                    Command::Increment { key, amount }
                } else {
                    Command::Decrement { key, amount }
                }
            }
            "MGET" => {
                arity(!args.is_empty())?;
                Command::Mget {
                    keys: args.to_vec(),
                }
            }
            "MSET" => {
                arity(!args.is_empty() && args.len() % 2 == 0)?;
                Command::Mset {
                    entries: value_pairs(args),
                }
            }
            "HSET" => {
                arity(args.len() == 3)?;
                Command::Hset {
                    key: args[0].clone(),
                    field: args[1].clone(),
                    value: Value::from(args[2].as_str()),
                }
            }
            "HGET" => {
                arity(args.len() == 2)?;
                Command::Hget {
                    key: args[0].clone(),
                    field: args[1].clone(),
                }
            }
            "HGETALL" => {
                arity(args.len() == 1)?;
                Command::Hgetall {
                    key: args[0].clone(),
                }
            }
            "HMSET" => {
                arity(args.len() >= 3 && args.len() % 2 == 1)?;
                Command::Hmset {
                    key: args[0].clone(),
                    fields: value_pairs(&args[1..]),
                }
            }
            "HMGET" => {
                arity(args.len() >= 2)?;
                Command::Hmget {
                    key: args[0].clone(),
                    fields: args[1..].to_vec(),
                }
            }
            "HEXISTS" => {
                arity(args.len() == 2)?;
                Command::Hexists {
                    key: args[0].clone(),
                    field: args[1].clone(),
                }
            }
            "HDEL" => {
                arity(args.len() >= 2)?;
                Command::Hdel {
                    key: args[0].clone(),
                    fields: args[1..].to_vec(),
                }
            }
            "HINCRBY" => {
                arity(args.len() == 3)?;
                Command::Hincrby {
                    key: args[0].clone(),
                    field: args[1].clone(),
                    increment: parse_int(&args[2])?,
                }
            }
            "HLEN" => {
                arity(args.len() == 1)?;
                Command::Hlen {
                    key: args[0].clone(),
                }
            }
            "SADD" | "SREM" => {
                arity(args.len() >= 2)?;
                let key = args[0].clone();
                let members = args[1..].to_vec();
                if name == "SADD" {
                    Command::Sadd { key, members }
                } else {
                    Command::Srem { key, members }
                }
            }
            "SMEMBERS" => {
                arity(args.len() == 1)?;
                Command::Smembers {
                    key: args[0].clone(),
                }
            }
            "SISMEMBER" => {
                arity(args.len() == 2)?;
                Command::Sismember {
                    key: args[0].clone(),
                    member: args[1].clone(),
                }
            }
            "SCARD" => {
                arity(args.len() == 1)?;
                Command::Scard {
                    key: args[0].clone(),
                }
            }
            "LPUSH" | "RPUSH" => {
                arity(args.len() >= 2)?;
                let key = args[0].clone();
                let values = args[1..].iter().map(|v| Value::from(v.as_str())).collect();
                if name == "LPUSH" {
                    Command::Lpush { key, values }
                } else {
                    Command::Rpush { key, values }
                }
            }
            "LPOP" | "RPOP" => {
                arity(args.len() == 1)?;
                let key = args[0].clone();
                if name == "LPOP" {
                    Command::Lpop { key }
                } else {
                    Command::Rpop { key }
                }
            }
            "LRANGE" => {
                arity(args.len() == 3)?;
                Command::Lrange {
                    key: args[0].clone(),
                    start: parse_int(&args[1])?,
                    stop: parse_int(&args[2])?,
                }
            }
            "LLEN" => {
                arity(args.len() == 1)?;
                Command::Llen {
                    key: args[0].clone(),
                }
            }
            "LREM" => {
                arity(args.len() == 3)?;
                Command::Lrem {
                    key: args[0].clone(),
                    count: parse_int(&args[1])?,
                    value: Value::from(args[2].as_str()),
                }
            }
            "ZADD" => {
                arity(args.len() >= 3 && args.len() % 2 == 1)?;
                let members = args[1..]
                    .chunks_exact(2)
                    .map(|pair| Ok((pair[1].clone(), parse_float(&pair[0])?)))
                    .collect::<Result<Vec<_>, CmdError>>()?;
                Command::Zadd {
                    key: args[0].clone(),
                    members,
                }
            }
            "ZINCRBY" => {
                arity(args.len() == 3)?;
                Command::Zincrby {
                    key: args[0].clone(),
                    increment: parse_float(&args[1])?,
                    member: args[2].clone(),
                }
            }
            "ZREM" => {
                arity(args.len() >= 2)?;
                Command::Zrem {
                    key: args[0].clone(),
                    members: args[1..].to_vec(),
                }
            }
            "ZSCORE" => {
                arity(args.len() == 2)?;
                Command::Zscore {
                    key: args[0].clone(),
                    member: args[1].clone(),
                }
            }
            "ZCARD" => {
                arity(args.len() == 1)?;
                Command::Zcard {
                    key: args[0].clone(),
                }
            }
            "ZRANGE" | "ZREVRANGE" => {
                arity(args.len() == 3 || args.len() == 4)?;
                let with_scores = match args.get(3) {
                    None => false,
                    Some(flag) if flag.eq_ignore_ascii_case("WITHSCORES") => true,
                    Some(flag) => {
                        return Err(CmdError::Syntax(format!("expected WITHSCORES, got {flag}")))
                    }
                };
                let key = args[0].clone();
                let start = parse_int(&args[1])?;
                let stop = parse_int(&args[2])?;
                if name == "ZRANGE" {
                    Command::Zrange {
                        key,
                        start,
                        stop,
                        with_scores,
                    }
                } else {
                    Command::Zrevrange {
                        key,
                        start,
                        stop,
                        with_scores,
                    }
                }
            }
            "ZRANK" | "ZREVRANK" => {
                arity(args.len() == 2)?;
                let key = args[0].clone();
                let member = args[1].clone();
                if name == "ZRANK" {
                    Command::Zrank { key, member }
                } else {
                    Command::Zrevrank { key, member }
                }
            }
            "ZCOUNT" => {
                arity(args.len() == 3)?;
                Command::Zcount {
                    key: args[0].clone(),
                    min: parse_float(&args[1])?,
                    max: parse_float(&args[2])?,
                }
            }
            "KEYS" => {
                arity(args.len() == 1)?;
                Command::Keys {
                    pattern: args[0].clone(),
                }
            }
            "CLEAR" => {
                arity(args.len() == 1)?;
                Command::Clear {
                    pattern: args[0].clone(),
                }
            }
            _ => return Err(CmdError::UnrecognizedCmd(first.clone())),
        };
        Ok(cmd)
    }
}

fn count(n: usize) -> Reply {
    Reply::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

fn as_strs(strings: &[String]) -> Vec<&str> {
    strings.iter().map(String::as_str).collect()
}

fn value_pairs(words: &[String]) -> Vec<(String, Value)> {
    words
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), Value::from(pair[1].as_str())))
        .collect()
}

fn parse_int(word: &str) -> Result<i64, CmdError> {
    word.parse()
        .map_err(|_| CmdError::IntegerParseError(word.to_string()))
}

/// Parses a score; `-inf`, `+inf` and `inf` are accepted for range bounds.
fn parse_float(word: &str) -> Result<f64, CmdError> {
    match word.to_ascii_lowercase().as_str() {
        "-inf" => Ok(f64::NEG_INFINITY),
        "+inf" | "inf" => Ok(f64::INFINITY),
        _ => word
            .parse::<f64>()
            .ok()
            .filter(|x| !x.is_nan())
            .ok_or_else(|| CmdError::FloatParseError(word.to_string())),
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Bool(b) => write!(f, "(integer) {}", i32::from(*b)),
            Reply::Integer(i) => write!(f, "(integer) {i}"),
            Reply::Value(Some(value)) => write!(f, "\"{value}\""),
            Reply::Value(None) => write!(f, "(nil)"),
            Reply::Score(Some(score)) => write!(f, "\"{score}\""),
            Reply::Score(None) => write!(f, "(nil)"),
            Reply::Rank(Some(rank)) => write!(f, "(integer) {rank}"),
            Reply::Rank(None) => write!(f, "(nil)"),
            Reply::Values(values) => write_numbered(
                f,
                values.iter().map(|v| match v {
                    Some(v) => format!("\"{v}\""),
                    None => "(nil)".to_string(),
                }),
            ),
            Reply::List(values) => write_numbered(f, values.iter().map(|v| format!("\"{v}\""))),
            Reply::Members(members) => {
                write_numbered(f, members.iter().map(|m| format!("\"{m}\"")))
            }
            Reply::Scored(scored) => write_numbered(
                f,
                scored
                    .iter()
                    .map(|m| format!("\"{}\" ({})", m.member, m.score)),
            ),
            Reply::Fields(fields) => {
                let mut fields: Vec<_> = fields.iter().collect();
                fields.sort_by(|a, b| a.0.cmp(b.0));
                write_numbered(f, fields.iter().map(|(k, v)| format!("\"{k}\" => \"{v}\"")))
            }
            Reply::Entries(entries) => {
                let mut entries: Vec<_> = entries.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                write_numbered(
                    f,
                    entries.iter().map(|(k, v)| match v {
                        Some(v) => format!("\"{k}\" => \"{v}\""),
                        None => format!("\"{k}\" => (nil)"),
                    }),
                )
            }
        }
    }
}

/// Writes one numbered line per item, or `(empty)` if there are none.
fn write_numbered(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = String>) -> fmt::Result {
    let mut empty = true;
    for (i, item) in items.enumerate() {
        if !empty {
            writeln!(f)?;
        }
        write!(f, "{}) {item}", i + 1)?;
        empty = false;
    }
    if empty {
        write!(f, "(empty)")?;
    }
    Ok(())
}
