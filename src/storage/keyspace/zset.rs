//! Sorted sets: the leaderboard engine.

use super::*;
use crate::errors::StoreError;
use crate::types::ScoredMember;

impl Keyspace {
    /// Adds members or updates their scores. Returns how many members are new.
    pub fn zadd(&mut self, key: &str, members: &[(&str, f64)]) -> usize {
        if members.is_empty() {
            return 0;
        }
        let zset = self.zsets.entry(key.to_string()).or_default();
        members
            .iter()
            .filter(|(member, score)| zset.add(member, *score))
            .count()
    }

    /// Adds `delta` to a member's score, an absent member counting as 0.
    ///
    /// Returns the new score; a non-finite result is rejected before anything is written.
    pub fn zincrby(&mut self, key: &str, delta: f64, member: &str) -> Result<f64, StoreError> {
        let score = self.zscore(key, member).unwrap_or(0.0) + delta;
        if !score.is_finite() {
            return Err(StoreError::NonFiniteScore {
                key: key.to_string(),
            });
        }
        let zset = self.zsets.entry(key.to_string()).or_default();
        zset.add(member, score);
        Ok(zset.score(member).unwrap_or(score))
    }

    /// Removes members and returns how many were present. Drops the set once it's empty.
    pub fn zrem(&mut self, key: &str, members: &[&str]) -> usize {
        let Some(zset) = self.zsets.get_mut(key) else {
            return 0;
        };
        let removed = members.iter().filter(|member| zset.remove(member)).count();
        if zset.is_empty() {
            self.zsets.remove(key);
            self.forget_if_gone(key);
        }
        removed
    }

    pub fn zscore(&self, key: &str, member: &str) -> Option<f64> {
        self.zsets.get(key)?.score(member)
    }

    pub fn zcard(&self, key: &str) -> usize {
        self.zsets.get(key).map_or(0, SortedSet::len)
    }

    /// Members by ascending score between two inclusive positions.
    pub fn zrange(&self, key: &str, start: i64, stop: i64) -> Vec<ScoredMember> {
        self.zsets
            .get(key)
            .map(|zset| scored(zset.range(start, stop)))
            .unwrap_or_default()
    }

    /// Members by descending score between two inclusive positions.
    pub fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Vec<ScoredMember> {
        self.zsets
            .get(key)
            .map(|zset| scored(zset.rev_range(start, stop)))
            .unwrap_or_default()
    }

    pub fn zrank(&self, key: &str, member: &str) -> Option<usize> {
        self.zsets.get(key)?.rank(member)
    }

    pub fn zrevrank(&self, key: &str, member: &str) -> Option<usize> {
        self.zsets.get(key)?.rev_rank(member)
    }

    /// Number of members with `min <= score <= max`.
    pub fn zcount(&self, key: &str, min: f64, max: f64) -> usize {
        self.zsets.get(key).map_or(0, |zset| zset.count(min, max))
    }
}

fn scored(pairs: Vec<(&str, f64)>) -> Vec<ScoredMember> {
    pairs
        .into_iter()
        .map(|(member, score)| ScoredMember::new(member, score))
        .collect()
}
