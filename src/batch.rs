//! # Batches
//!
//! Sequential execution of several [`Command`]s as one request.
//!
//! A batch is not atomic. Commands run one at a time, each under its own lock, so other
//! callers may interleave between them. The first failing command stops the batch and its
//! error is returned as is; commands that ran before it stay applied.

use crate::cmd::{Command, Reply};
use crate::errors::StoreError;
use crate::storage::Storage;
use crate::types::{StorageKey, Value};
use log::{trace, warn};

/// Runs the commands in order, collecting their replies.
pub fn run_batch<S: Storage + ?Sized>(
    store: &S,
    commands: &[Command],
) -> Result<Vec<Reply>, StoreError> {
    trace!("Running a batch of {} commands", commands.len());

    let mut replies = Vec::with_capacity(commands.len());
    for (i, cmd) in commands.iter().enumerate() {
        match cmd.apply(store) {
            Ok(reply) => replies.push(reply),
            Err(err) => {
                warn!("Batch stopped at command {i} ({}): {err}", cmd.name());
                return Err(err);
            }
        }
    }
    Ok(replies)
}

/// A chained batch builder
///
/// ```
/// use gamestore::storage::{MemoryStore, Storage, StoreConfig};
///
/// let store = MemoryStore::connected(StoreConfig::ephemeral()).unwrap();
/// let replies = store
///     .multi()
///     .increment("points:u1", 10)
///     .zincrby("leaderboard", 10.0, "u1")
///     .exec()
///     .unwrap();
/// assert_eq!(2, replies.len());
/// ```
pub struct Multi<'a, S: ?Sized> {
    store: &'a S,
    commands: Vec<Command>,
}

impl<'a, S: Storage + ?Sized> Multi<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            commands: Vec::new(),
        }
    }

    /// Queues any command.
    pub fn push(mut self, cmd: Command) -> Self {
        self.commands.push(cmd);
        self
    }

    pub fn set(self, key: impl Into<StorageKey>, value: impl Into<Value>) -> Self {
        self.push(Command::Set {
            key: key.into(),
            value: value.into(),
            ttl: None,
        })
    }

    pub fn setex(self, key: impl Into<StorageKey>, seconds: i64, value: impl Into<Value>) -> Self {
        self.push(Command::Setex {
            key: key.into(),
            seconds,
            value: value.into(),
        })
    }

    pub fn delete(self, key: impl Into<StorageKey>) -> Self {
        self.push(Command::Delete { key: key.into() })
    }

    pub fn expire(self, key: impl Into<StorageKey>, seconds: i64) -> Self {
        self.push(Command::Expire {
            key: key.into(),
            seconds,
        })
    }

    pub fn increment(self, key: impl Into<StorageKey>, amount: i64) -> Self {
        self.push(Command::Increment {
            key: key.into(),
            amount,
        })
    }

    pub fn decrement(self, key: impl Into<StorageKey>, amount: i64) -> Self {
        self.push(Command::Decrement {
            key: key.into(),
            amount,
        })
    }

    pub fn hset(
        self,
        key: impl Into<StorageKey>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.push(Command::Hset {
            key: key.into(),
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn hincrby(
        self,
        key: impl Into<StorageKey>,
        field: impl Into<String>,
        increment: i64,
    ) -> Self {
        self.push(Command::Hincrby {
            key: key.into(),
            field: field.into(),
            increment,
        })
    }

    pub fn sadd(self, key: impl Into<StorageKey>, member: impl Into<String>) -> Self {
        self.push(Command::Sadd {
            key: key.into(),
            members: vec![member.into()],
        })
    }

    pub fn lpush(self, key: impl Into<StorageKey>, value: impl Into<Value>) -> Self {
        self.push(Command::Lpush {
            key: key.into(),
            values: vec![value.into()],
        })
    }

    pub fn rpush(self, key: impl Into<StorageKey>, value: impl Into<Value>) -> Self {
        self.push(Command::Rpush {
            key: key.into(),
            values: vec![value.into()],
        })
    }

    pub fn zadd(self, key: impl Into<StorageKey>, score: f64, member: impl Into<String>) -> Self {
        self.push(Command::Zadd {
            key: key.into(),
            members: vec![(member.into(), score)],
        })
    }

    pub fn zincrby(
        self,
        key: impl Into<StorageKey>,
        increment: f64,
        member: impl Into<String>,
    ) -> Self {
        self.push(Command::Zincrby {
            key: key.into(),
            increment,
            member: member.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The queued commands, in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Runs the queued commands, see [`run_batch`].
    pub fn exec(self) -> Result<Vec<Reply>, StoreError> {
        run_batch(self.store, &self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StoreConfig};

    fn store() -> MemoryStore {
        MemoryStore::connected(StoreConfig::ephemeral()).unwrap()
    }

    fn set(key: &str, value: &str) -> Command {
        Command::Set {
            key: key.to_string(),
            value: Value::from(value),
            ttl: None,
        }
    }

    #[test]
    fn replies_in_order() {
        let store = store();
        let replies = store
            .transaction(&[
                set("name", "Ada"),
                Command::Increment {
                    key: "points".to_string(),
                    amount: 3,
                },
                Command::Get {
                    key: "name".to_string(),
                },
            ])
            .unwrap();

        assert_eq!(
            vec![
                Reply::Ok,
                Reply::Integer(3),
                Reply::Value(Some(Value::from("Ada")))
            ],
            replies
        );
    }

    #[test]
    fn empty_batch() {
        let store = store();
        assert_eq!(Ok(vec![]), store.transaction(&[]));
        assert!(store.multi().is_empty());
    }

    #[test]
    fn failure_stops_without_rollback() {
        let store = store();
        let result = store.transaction(&[set("a", "1"), set("", "2"), set("c", "3")]);

        assert_eq!(Err(StoreError::EmptyKey), result);
        assert_eq!(Ok(Some(Value::from("1"))), store.get("a"));
        assert_eq!(Ok(None), store.get("c"));
    }

    #[test]
    fn type_conflict_mid_batch() {
        let store = store();
        store.set("name", Value::from("Ada"), None).unwrap();

        let result = store
            .multi()
            .increment("points", 5)
            .increment("name", 1)
            .increment("points", 5)
            .exec();

        assert!(matches!(result, Err(StoreError::NotAnInteger { .. })));
        assert_eq!(Ok(Some(Value::Int(5))), store.get("points"));
    }

    #[test]
    fn multi_builds_commands() {
        let store = store();
        let multi = store
            .multi()
            .set("k", "v")
            .zadd("lb", 1.0, "u1")
            .sadd("badges:u1", "first_login");

        assert_eq!(3, multi.len());
        assert_eq!(
            vec!["SET", "ZADD", "SADD"],
            multi.commands().iter().map(Command::name).collect::<Vec<_>>()
        );
        assert_eq!(
            Ok(vec![Reply::Ok, Reply::Integer(1), Reply::Integer(1)]),
            multi.exec()
        );
    }

    #[test]
    fn award_points_flow() {
        let store = store();
        for _ in 0..3 {
            store
                .multi()
                .hincrby("user:u1", "points", 10)
                .zincrby("leaderboard:global", 10.0, "u1")
                .lpush("activity:u1", "points_awarded")
                .exec()
                .unwrap();
        }

        assert_eq!(Ok(Some(Value::Int(30))), store.hget("user:u1", "points"));
        assert_eq!(Ok(Some(30.0)), store.zscore("leaderboard:global", "u1"));
        assert_eq!(Ok(3), store.llen("activity:u1"));
    }

    #[test]
    fn batch_on_disconnected_store() {
        let store = store();
        store.disconnect().unwrap();
        assert_eq!(
            Err(StoreError::NotConnected),
            store.multi().set("k", "v").exec()
        );
    }

    #[test]
    fn run_batch_through_trait_object() {
        let store: Box<dyn Storage> = Box::new(store());
        let replies = store
            .transaction(&[Command::Sadd {
                key: "s".to_string(),
                members: vec!["a".to_string(), "b".to_string()],
            }])
            .unwrap();
        assert_eq!(vec![Reply::Integer(2)], replies);
    }
}
