//! Sets: unordered collections of unique members.

use super::*;

impl Keyspace {
    /// Adds members and returns how many weren't already present.
    pub fn sadd(&mut self, key: &str, members: &[&str]) -> usize {
        if members.is_empty() {
            return 0;
        }
        let set = self.sets.entry(key.to_string()).or_default();
        members
            .iter()
            .filter(|member| set.insert(member.to_string()))
            .count()
    }

    /// Removes members and returns how many were present. Drops the set once it's empty.
    pub fn srem(&mut self, key: &str, members: &[&str]) -> usize {
        let Some(set) = self.sets.get_mut(key) else {
            return 0;
        };
        let removed = members.iter().filter(|member| set.remove(**member)).count();
        if set.is_empty() {
            self.sets.remove(key);
            self.forget_if_gone(key);
        }
        removed
    }

    /// All members, in lexicographic order for reproducible output.
    pub fn smembers(&self, key: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }

    pub fn sismember(&self, key: &str, member: &str) -> bool {
        self.sets.get(key).is_some_and(|set| set.contains(member))
    }

    pub fn scard(&self, key: &str) -> usize {
        self.sets.get(key).map_or(0, HashSet::len)
    }
}
