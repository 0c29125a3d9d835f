//! # Types
//!
//! Types used throughout the application
//!
//! The store keeps one map per data type, plus an auxiliary map of expiration times:
//! - scalars map keys to [`Value`]s,
//! - hashes, lists, sets and sorted sets map keys to their collections,
//! - the expiry table maps keys to absolute expiration times, but only if the time is set for the key.
//!
//! In this way we save on storage space, as many keys never expire.

use crate::storage::keyspace::Keyspace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Primary key
pub type StorageKey = String;
/// Raw (inner) type of an absolute expiration time in milliseconds since the UNIX epoch
pub type ExpirationTimeType = u128;
/// Expiration time of an entry in the storage. `None` means the entry never expires.
pub type ExpirationTime = Option<ExpirationTimeType>;
/// Shared state of the in-memory engine; `None` while disconnected
pub type ConcurrentStorageType = Arc<RwLock<Option<Keyspace>>>;

/// A stored value
///
/// Scalars, hash fields and list elements are heterogeneous, so they are modelled
/// as a tagged union rather than raw bytes. Serializes to and from plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Any structured JSON document (objects, arrays, null)
    Document(serde_json::Value),
}

impl Value {
    /// Interprets the value as an integer, if it has an integer reading.
    ///
    /// Integral floats and decimal strings qualify; everything else doesn't.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                if *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            Value::Str(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Document(doc) => write!(f, "{doc}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(doc: serde_json::Value) -> Self {
        Value::Document(doc)
    }
}

/// A sorted-set member paired with its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMember {
    pub member: String,
    pub score: f64,
}

impl ScoredMember {
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}
