//! # Gamestore Library
//!
//! A multi-model key-value store (scalars, hashes, sets, lists, sorted sets, with expiry)
//! that backs gamification features such as points, streaks, quests and leaderboards.
//!
//! The [`Storage`](storage::Storage) trait is the contract every backend implements;
//! [`MemoryStore`](storage::MemoryStore) is the in-process reference engine.

pub mod batch;
pub mod cli;
pub mod cmd;
pub mod console;
pub mod constants;
pub mod errors;
pub mod expiry;
#[macro_use]
pub mod macros;
pub mod pattern;
pub mod storage;
pub mod types;
