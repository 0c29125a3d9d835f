//! Scalar values: plain strings, numbers, booleans and documents.

use super::*;
use crate::errors::StoreError;
use crate::types::ExpirationTime;

impl Keyspace {
    /// Returns a copy of the scalar value, or `None` if there is none.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.scalars.get(key).cloned()
    }

    /// Sets the scalar value of a key.
    ///
    /// The expiration time belongs to the key, not to the scalar. A `deadline` replaces it.
    /// Without one, it is discarded only if the scalar is the key's only data, so a plain
    /// write doesn't make a collection under the same key permanent.
    pub fn set(&mut self, key: &str, value: Value, deadline: ExpirationTime) {
        self.scalars.insert(key.to_string(), value);
        match deadline {
            Some(deadline) => self.expiry.set(key, deadline),
            None if !self.held_by_collection(key) => {
                self.expiry.remove(key);
            }
            None => {}
        }
    }

    /// Adds `delta` to the integer reading of the scalar value and returns the result.
    ///
    /// An absent value counts as 0. The key's expiration time, if any, is left intact.
    pub fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let current = match self.scalars.get(key) {
            None => 0,
            Some(value) => value.as_integer().ok_or_else(|| StoreError::NotAnInteger {
                key: key.to_string(),
            })?,
        };
        let updated = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::Overflow {
                key: key.to_string(),
            })?;
        self.scalars.insert(key.to_string(), Value::Int(updated));
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let mut ks = Keyspace::new();
        ks.set("k", Value::from("v"), None);
        assert_eq!(Some(Value::from("v")), ks.get("k"));
        assert_eq!(None, ks.get("other"));
    }

    #[test]
    fn set_without_deadline_discards_expiry() {
        let mut ks = Keyspace::new();
        ks.set("k", Value::Int(1), Some(1_000));
        ks.set("k", Value::Int(2), None);
        assert_eq!(None, ks.expiry().get("k"));
    }

    #[test]
    fn incr_by_treats_absent_as_zero() {
        let mut ks = Keyspace::new();
        assert_eq!(Ok(5), ks.incr_by("points", 5));
        assert_eq!(Ok(2), ks.incr_by("points", -3));
        assert_eq!(Some(Value::Int(2)), ks.get("points"));
    }

    #[test]
    fn incr_by_reads_numeric_strings() {
        let mut ks = Keyspace::new();
        ks.set("k", Value::from("41"), None);
        assert_eq!(Ok(42), ks.incr_by("k", 1));
    }

    #[test]
    fn incr_by_keeps_deadline() {
        let mut ks = Keyspace::new();
        ks.set("k", Value::Int(5), Some(99_000));
        assert_eq!(Ok(8), ks.incr_by("k", 3));
        assert_eq!(Some(99_000), ks.expiry().get("k"));
    }

    #[test]
    fn incr_by_rejects_non_integers_without_mutation() {
        let mut ks = Keyspace::new();
        ks.set("k", Value::from("abc"), None);
        assert_eq!(
            Err(StoreError::NotAnInteger {
                key: "k".to_string()
            }),
            ks.incr_by("k", 1)
        );
        assert_eq!(Some(Value::from("abc")), ks.get("k"));
    }

    #[test]
    fn incr_by_detects_overflow() {
        let mut ks = Keyspace::new();
        ks.set("k", Value::Int(i64::MAX), None);
        assert!(matches!(
            ks.incr_by("k", 1),
            Err(StoreError::Overflow { .. })
        ));
        assert_eq!(Some(Value::Int(i64::MAX)), ks.get("k"));
    }

    #[test]
    fn plain_set_keeps_collection_window() {
        let mut ks = Keyspace::new();
        ks.hset("k", "f", Value::Int(1));
        ks.expire("k", 100_000);

        ks.set("k", Value::Int(1), None);
        assert_eq!(Some(100_000), ks.expiry().get("k"));
        assert_eq!(Some(Value::Int(1)), ks.hget("k", "f"));
    }

    #[test]
    fn plain_set_drops_expiry_of_scalar_only_key() {
        let mut ks = Keyspace::new();
        ks.set("k", Value::Int(1), Some(100_000));
        ks.set("k", Value::Int(2), None);
        assert_eq!(None, ks.expiry().get("k"));
    }

    #[test]
    fn set_with_deadline_replaces_key_window() {
        let mut ks = Keyspace::new();
        ks.sadd("k", &["a"]);
        ks.expire("k", 100_000);
        ks.set("k", Value::Int(1), Some(5_000));
        assert_eq!(Some(5_000), ks.expiry().get("k"));
    }
}
