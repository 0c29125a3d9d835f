//! Lists: ordered sequences with push and pop at both ends.

use super::*;
use crate::storage::normalize_range;

impl Keyspace {
    /// Prepends values one by one, so the last one ends up at the head.
    ///
    /// Returns the new length of the list.
    pub fn lpush(&mut self, key: &str, values: Vec<Value>) -> usize {
        self.list_push(key, values, true)
    }

    /// Appends values in order. Returns the new length of the list.
    pub fn rpush(&mut self, key: &str, values: Vec<Value>) -> usize {
        self.list_push(key, values, false)
    }

    /// Removes and returns the head of the list; `None` for an empty or absent list.
    pub fn lpop(&mut self, key: &str) -> Option<Value> {
        self.list_pop(key, true)
    }

    /// Removes and returns the tail of the list; `None` for an empty or absent list.
    pub fn rpop(&mut self, key: &str) -> Option<Value> {
        self.list_pop(key, false)
    }

    /// Elements between two positions, inclusive on both ends.
    ///
    /// Negative positions count from the end (-1 is the last element).
    /// Out-of-bounds positions are clamped.
    pub fn lrange(&self, key: &str, start: i64, stop: i64) -> Vec<Value> {
        let Some(list) = self.lists.get(key) else {
            return Vec::new();
        };
        match normalize_range(start, stop, list.len()) {
            Some((s, e)) => list.range(s..=e).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn llen(&self, key: &str) -> usize {
        self.lists.get(key).map_or(0, VecDeque::len)
    }

    /// Removes elements equal to `value` and returns how many were removed:
    /// - `count > 0`: the first `count` matches from the head,
    /// - `count < 0`: the first `|count|` matches from the tail,
    /// - `count == 0`: all matches.
    ///
    /// Survivors keep their relative order. Drops the list once it's empty.
    pub fn lrem(&mut self, key: &str, count: i64, value: &Value) -> usize {
        let Some(list) = self.lists.get_mut(key) else {
            return 0;
        };

        let limit = match count {
            0 => usize::MAX,
            n => usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX),
        };
        let matches = list
            .iter()
            .enumerate()
            .filter(|(_, element)| *element == value)
            .map(|(idx, _)| idx);
        let hits: Vec<usize> = if count < 0 {
            matches.rev().take(limit).collect()
        } else {
            matches.take(limit).collect()
        };

        let mut doomed = vec![false; list.len()];
        for &idx in &hits {
            doomed[idx] = true;
        }
        let mut idx = 0;
        list.retain(|_| {
            let keep = !doomed[idx];
            idx += 1;
            keep
        });

        if list.is_empty() {
            self.lists.remove(key);
            self.forget_if_gone(key);
        }
        hits.len()
    }

    fn list_push(&mut self, key: &str, values: Vec<Value>, left: bool) -> usize {
        if values.is_empty() {
            return self.llen(key);
        }
        let list = self.lists.entry(key.to_string()).or_default();
        for value in values {
            if left {
                list.push_front(value);
            } else {
                list.push_back(value);
            }
        }
        list.len()
    }

    fn list_pop(&mut self, key: &str, left: bool) -> Option<Value> {
        let list = self.lists.get_mut(key)?;
        let popped = if left {
            list.pop_front()
        } else {
            list.pop_back()
        };
        if list.is_empty() {
            self.lists.remove(key);
            self.forget_if_gone(key);
        }
        popped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn lpush_places_last_value_at_head() {
        let mut ks = Keyspace::new();
        assert_eq!(3, ks.lpush("k", strs(&["a", "b", "c"])));
        assert_eq!(strs(&["c", "b", "a"]), ks.lrange("k", 0, -1));
    }

    #[test]
    fn rpush_appends_in_order() {
        let mut ks = Keyspace::new();
        ks.rpush("k", strs(&["a", "b"]));
        assert_eq!(3, ks.rpush("k", strs(&["c"])));
        assert_eq!(strs(&["a", "b", "c"]), ks.lrange("k", 0, -1));
    }

    #[test]
    fn lrange_negative_indices() {
        let mut ks = Keyspace::new();
        ks.rpush("k", strs(&["x0", "x1", "x2", "x3"]));
        assert_eq!(strs(&["x2", "x3"]), ks.lrange("k", -2, -1));
        assert_eq!(strs(&["x0", "x1", "x2", "x3"]), ks.lrange("k", -50, 50));
        assert!(ks.lrange("k", 2, 1).is_empty());
        assert!(ks.lrange("missing", 0, -1).is_empty());
    }

    #[test]
    fn pop_from_both_ends() {
        let mut ks = Keyspace::new();
        ks.rpush("k", strs(&["a", "b", "c"]));
        assert_eq!(Some(Value::from("a")), ks.lpop("k"));
        assert_eq!(Some(Value::from("c")), ks.rpop("k"));
        assert_eq!(Some(Value::from("b")), ks.rpop("k"));
        assert_eq!(None, ks.lpop("k"));
        assert!(!ks.contains("k"));
    }

    #[test]
    fn lrem_from_head() {
        let mut ks = Keyspace::new();
        ks.rpush("k", strs(&["a", "x", "b", "x", "c", "x"]));
        assert_eq!(2, ks.lrem("k", 2, &Value::from("x")));
        assert_eq!(strs(&["a", "b", "c", "x"]), ks.lrange("k", 0, -1));
    }

    #[test]
    fn lrem_from_tail() {
        let mut ks = Keyspace::new();
        ks.rpush("k", strs(&["x", "a", "x", "b", "x"]));
        assert_eq!(2, ks.lrem("k", -2, &Value::from("x")));
        assert_eq!(strs(&["x", "a", "b"]), ks.lrange("k", 0, -1));
    }

    #[test]
    fn lrem_all() {
        let mut ks = Keyspace::new();
        ks.rpush("k", strs(&["x", "a", "x"]));
        assert_eq!(2, ks.lrem("k", 0, &Value::from("x")));
        assert_eq!(strs(&["a"]), ks.lrange("k", 0, -1));
        assert_eq!(1, ks.lrem("k", 0, &Value::from("a")));
        assert!(!ks.contains("k"));
        assert_eq!(0, ks.lrem("k", 0, &Value::from("a")));
    }

    #[test]
    fn emptying_list_forgets_expiry() {
        let mut ks = Keyspace::new();

        ks.rpush("l", strs(&["a"]));
        ks.expire("l", 1_000);
        ks.lpop("l");
        assert_eq!(None, ks.expiry().get("l"));

        ks.rpush("l", strs(&["b"]));
        ks.expire("l", 1_000);
        ks.rpop("l");
        assert_eq!(None, ks.expiry().get("l"));

        ks.rpush("l", strs(&["c", "c"]));
        ks.expire("l", 1_000);
        ks.lrem("l", 0, &Value::from("c"));
        assert_eq!(None, ks.expiry().get("l"));

        ks.rpush("l", strs(&["d"]));
        assert_eq!(TTL_NO_EXPIRY, ks.ttl("l", 5_000));
        assert!(ks.expiry().is_empty());
    }
}
