//! Hashes: per-key records of field → value.

use super::*;
use crate::errors::StoreError;

impl Keyspace {
    /// Sets a field. Returns `true` if the field is new.
    pub fn hset(&mut self, key: &str, field: &str, value: Value) -> bool {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value)
            .is_none()
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<Value> {
        self.hashes.get(key)?.get(field).cloned()
    }

    /// All fields and values; empty for an absent key.
    pub fn hgetall(&self, key: &str) -> HashMap<String, Value> {
        self.hashes.get(key).cloned().unwrap_or_default()
    }

    /// Sets several fields at once.
    pub fn hmset(&mut self, key: &str, fields: Vec<(String, Value)>) {
        if fields.is_empty() {
            return;
        }
        self.hashes.entry(key.to_string()).or_default().extend(fields);
    }

    /// Values of the given fields, in the same order; `None` for absent fields.
    pub fn hmget(&self, key: &str, fields: &[&str]) -> Vec<Option<Value>> {
        let hash = self.hashes.get(key);
        fields
            .iter()
            .map(|field| hash.and_then(|h| h.get(*field)).cloned())
            .collect()
    }

    pub fn hexists(&self, key: &str, field: &str) -> bool {
        self.hashes.get(key).is_some_and(|h| h.contains_key(field))
    }

    /// Removes fields and returns how many were present. Drops the hash once it's empty.
    pub fn hdel(&mut self, key: &str, fields: &[&str]) -> usize {
        let Some(hash) = self.hashes.get_mut(key) else {
            return 0;
        };
        let removed = fields
            .iter()
            .filter(|field| hash.remove(**field).is_some())
            .count();
        if hash.is_empty() {
            self.hashes.remove(key);
            self.forget_if_gone(key);
        }
        removed
    }

    /// Adds `delta` to the integer reading of a field and returns the result.
    ///
    /// An absent field counts as 0; a field without an integer reading is a type conflict,
    /// reported before anything is written.
    pub fn hincrby(&mut self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        let current = match self.hget(key, field) {
            None => 0,
            Some(value) => value
                .as_integer()
                .ok_or_else(|| StoreError::FieldNotAnInteger {
                    key: key.to_string(),
                    field: field.to_string(),
                })?,
        };
        let updated = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::Overflow {
                key: key.to_string(),
            })?;
        self.hset(key, field, Value::Int(updated));
        Ok(updated)
    }

    pub fn hlen(&self, key: &str) -> usize {
        self.hashes.get(key).map_or(0, HashMap::len)
    }
}
