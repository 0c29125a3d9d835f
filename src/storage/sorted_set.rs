//! Sorted set data structure: dual-indexed by member and by rank.
//!
//! Each member has a unique name, an `f64` score and an insertion sequence number.
//! Members are ordered by (score, insertion sequence): ties in score are broken by
//! insertion order, first inserted first, which keeps leaderboards reproducible.
//! Updating a member's score keeps its sequence number; removing and re-adding it
//! assigns a new one.
//!
//! Descending queries order by score descending, but still list members that share
//! a score in insertion order.
//!
//! The ordered index is a sorted `Vec`, giving O(log n) rank queries via binary search
//! and contiguous iteration; the member index is a `HashMap` for O(1) score lookups.
//! Member strings are shared between both through `Arc<str>`.

use super::normalize_range;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// A score with a total order. NaN is never stored.
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl Score {
    /// Folds `-0.0` into `0.0`, so both compare equal under the total order.
    fn new(score: f64) -> Self {
        Self(score + 0.0)
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One slot of the ordered index
#[derive(Debug, Clone)]
struct Slot {
    score: Score,
    seq: u64,
    member: Arc<str>,
}

impl Slot {
    fn position(&self) -> (Score, u64) {
        (self.score, self.seq)
    }
}

/// A sorted set of unique string members, each with a floating-point score.
#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    /// Kept sorted by `(score, seq)` at all times.
    sorted: Vec<Slot>,
    /// Member → (score, seq)
    members: HashMap<Arc<str>, (Score, u64)>,
    next_seq: u64,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member or updates its score. Returns `true` if the member is new.
    pub fn add(&mut self, member: &str, score: f64) -> bool {
        let score = Score::new(score);

        if let Some((name, &(old_score, seq))) = self.members.get_key_value(member) {
            if old_score == score {
                return false;
            }
            let name = Arc::clone(name);
            if let Ok(old_idx) = self.search((old_score, seq)) {
                self.sorted.remove(old_idx);
            }
            self.members.insert(Arc::clone(&name), (score, seq));
            self.insert_slot(Slot {
                score,
                seq,
                member: name,
            });
            false
        } else {
            let seq = self.next_seq;
            self.next_seq += 1;
            let name: Arc<str> = Arc::from(member);
            self.members.insert(Arc::clone(&name), (score, seq));
            self.insert_slot(Slot {
                score,
                seq,
                member: name,
            });
            true
        }
    }

    /// Removes a member. Returns `true` if it existed.
    pub fn remove(&mut self, member: &str) -> bool {
        match self.members.remove(member) {
            Some(position) => {
                if let Ok(idx) = self.search(position) {
                    self.sorted.remove(idx);
                }
                true
            }
            None => false,
        }
    }

    pub fn score(&self, member: &str) -> Option<f64> {
        self.members.get(member).map(|(score, _)| score.0)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// 0-based position in ascending order, or `None` if the member is absent.
    pub fn rank(&self, member: &str) -> Option<usize> {
        let &position = self.members.get(member)?;
        self.search(position).ok()
    }

    /// 0-based position in descending order, or `None` if the member is absent.
    ///
    /// Members with a higher score come first; among equal scores, insertion order holds.
    pub fn rev_rank(&self, member: &str) -> Option<usize> {
        let &(score, seq) = self.members.get(member)?;
        let idx = self.search((score, seq)).ok()?;
        let ties_start = self.sorted.partition_point(|slot| slot.score < score);
        let ties_end = self.sorted.partition_point(|slot| slot.score <= score);
        let higher = self.sorted.len() - ties_end;
        Some(higher + (idx - ties_start))
    }

    /// Members between two ascending positions, inclusive on both ends.
    ///
    /// Negative positions count from the end; out-of-range positions are clamped.
    pub fn range(&self, start: i64, stop: i64) -> Vec<(&str, f64)> {
        match normalize_range(start, stop, self.sorted.len()) {
            Some((s, e)) => self.sorted[s..=e]
                .iter()
                .map(|slot| (&*slot.member, slot.score.0))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Members between two descending positions, inclusive on both ends.
    ///
    /// Negative positions count from the end; out-of-range positions are clamped.
    pub fn rev_range(&self, start: i64, stop: i64) -> Vec<(&str, f64)> {
        match normalize_range(start, stop, self.sorted.len()) {
            Some((s, e)) => self
                .descending()
                .skip(s)
                .take(e - s + 1)
                .map(|slot| (&*slot.member, slot.score.0))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of members with `min <= score <= max`.
    ///
    /// Infinite bounds are allowed and mean "unbounded".
    pub fn count(&self, min: f64, max: f64) -> usize {
        let from = self.sorted.partition_point(|slot| slot.score.0 < min);
        let to = self.sorted.partition_point(|slot| slot.score.0 <= max);
        to.saturating_sub(from)
    }

    /// Iterates over (member, score) pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.sorted
            .iter()
            .map(|slot| (&*slot.member, slot.score.0))
    }

    /// Walks the index from the highest score down, one run of equal scores at a time,
    /// keeping each run in insertion order.
    fn descending(&self) -> impl Iterator<Item = &Slot> {
        let mut end = self.sorted.len();
        std::iter::from_fn(move || {
            if end == 0 {
                return None;
            }
            let score = self.sorted[end - 1].score;
            let start = self.sorted[..end].partition_point(|slot| slot.score < score);
            let run = &self.sorted[start..end];
            end = start;
            Some(run.iter())
        })
        .flatten()
    }

    fn search(&self, position: (Score, u64)) -> Result<usize, usize> {
        self.sorted
            .binary_search_by(|slot| slot.position().cmp(&position))
    }

    fn insert_slot(&mut self, slot: Slot) {
        let idx = self.search(slot.position()).unwrap_or_else(|idx| idx);
        self.sorted.insert(idx, slot);
    }
}
