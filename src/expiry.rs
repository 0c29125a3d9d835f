//! Expiry Facility
//!
//! Absolute expiration times of keys, and a background thread for eviction of expired keys.
//!
//! Expiry is enforced in two ways:
//! - lazily, by every operation, which purges the key it touches if the key has expired,
//! - actively, by the [`Sweeper`], which purges all expired keys every
//!   [`Hz`](crate::constants::HZ_MS) milliseconds by default.

use crate::constants::MS_PER_SEC;
use crate::errors::StoreError;
use crate::types::{ConcurrentStorageType, ExpirationTime, ExpirationTimeType, StorageKey};
use log::{debug, error};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current time in milliseconds since the UNIX epoch
pub fn now_ms() -> ExpirationTimeType {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Absolute expiration time `seconds` from `now`.
///
/// Zero or negative `seconds` yield `now`, i.e., a key that is already expired.
pub fn deadline_after_secs(now: ExpirationTimeType, seconds: i64) -> ExpirationTimeType {
    if seconds <= 0 {
        now
    } else {
        now + seconds as ExpirationTimeType * MS_PER_SEC
    }
}

/// Maps keys to their absolute expiration times
///
/// Keys without an entry never expire.
#[derive(Debug, Clone, Default)]
pub struct ExpiryTable {
    deadlines: HashMap<StorageKey, ExpirationTimeType>,
}

impl ExpiryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or overwrites the expiration time of a key
    pub fn set(&mut self, key: &str, deadline: ExpirationTimeType) {
        self.deadlines.insert(key.to_string(), deadline);
    }

    pub fn get(&self, key: &str) -> ExpirationTime {
        self.deadlines.get(key).copied()
    }

    /// Removes the expiration time of a key. Returns `true` if there was one.
    pub fn remove(&mut self, key: &str) -> bool {
        self.deadlines.remove(key).is_some()
    }

    /// A key has expired once its deadline is not in the future.
    pub fn is_expired(&self, key: &str, now: ExpirationTimeType) -> bool {
        self.deadlines
            .get(key)
            .is_some_and(|&deadline| deadline <= now)
    }

    /// Keys whose deadline has passed
    pub fn expired_keys(&self, now: ExpirationTimeType) -> Vec<StorageKey> {
        self.deadlines
            .iter()
            .filter(|&(_, &deadline)| deadline <= now)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Whole seconds left until the key expires, rounded down.
    ///
    /// `None` if the key has no expiration time.
    pub fn remaining_secs(&self, key: &str, now: ExpirationTimeType) -> Option<i64> {
        self.deadlines.get(key).map(|&deadline| {
            let left = deadline.saturating_sub(now) / MS_PER_SEC;
            i64::try_from(left).unwrap_or(i64::MAX)
        })
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

/// Handle to the background eviction thread
///
/// The thread is stopped and joined by [`Sweeper::stop`], or when the handle is dropped.
#[derive(Debug)]
pub struct Sweeper {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Starts the eviction thread on the given storage
    pub fn spawn(storage: ConcurrentStorageType, interval: Duration) -> Result<Self, StoreError> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("gamestore-sweeper".to_string())
            .spawn(move || {
                if let Err(e) = eviction_loop(storage, interval, stop_rx) {
                    error!("Expiry sweeper stopped: {e}");
                }
            })
            .map_err(|e| StoreError::SweeperSpawn(e.to_string()))?;
        debug!("Expiry sweeper started, interval {} ms", interval.as_millis());

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Signals the eviction thread to stop and waits for it to finish
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender wakes the thread up immediately.
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Expiry sweeper panicked");
            }
            debug!("Expiry sweeper stopped");
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Removes expired keys from the storage
///
/// Meant to be run in a background thread as it loops until the stop channel is closed.
///
/// It waits for `interval` and then removes expired keys from the storage, holding the
/// same write lock as foreground operations.
fn eviction_loop(
    storage: ConcurrentStorageType,
    interval: Duration,
    stop_rx: Receiver<()>,
) -> Result<(), StoreError> {
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }

        let mut guard = storage.write().map_err(|_| StoreError::Poisoned)?;
        if let Some(keyspace) = guard.as_mut() {
            let removed = keyspace.sweep_expired(now_ms());
            if removed > 0 {
                debug!("Swept {removed} expired key(s)");
            }
        }
    }
}
