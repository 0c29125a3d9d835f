//! # Storage
//!
//! The [`Storage`] contract (Data Abstraction Layer) and its in-memory reference engine.

pub mod generic;
pub mod inmemory;
pub mod keyspace;
pub mod sorted_set;

pub use generic::Storage;
pub use inmemory::{MemoryStore, StoreConfig};

/// Converts an inclusive `start..=stop` position range, where negative positions count
/// from the end, into valid indices for a sequence of length `len`.
///
/// Out-of-bounds positions are clamped. Returns `None` if the range is empty.
pub(crate) fn normalize_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let start = if start < 0 { start + len } else { start }.max(0);
    let stop = if stop < 0 { stop + len } else { stop }.min(len - 1);
    if len == 0 || start > stop {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}
