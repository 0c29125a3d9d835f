//! # Errors
//!
//! Error types and helper functions used in the library

use crate::types::StorageKey;
use thiserror::Error;

/// Application errors
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    StoreError(#[from] StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors related to working with [`crate::storage`]
///
/// Every error is raised before any state is mutated by the failing operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("store is not connected")]
    NotConnected,

    #[error("key must be a non-empty string")]
    EmptyKey,

    #[error("field must be a non-empty string")]
    EmptyField,

    #[error("{name} must be a finite number")]
    NonFinite { name: &'static str },

    #[error("{name} must be a number")]
    NotANumber { name: &'static str },

    #[error("{name} must not be negative")]
    Negative { name: &'static str },

    #[error("value at '{key}' is not an integer")]
    NotAnInteger { key: StorageKey },

    #[error("hash field '{field}' at '{key}' is not an integer")]
    FieldNotAnInteger { key: StorageKey, field: String },

    #[error("increment or decrement would overflow the value at '{key}'")]
    Overflow { key: StorageKey },

    #[error("resulting score for '{key}' is not a finite number")]
    NonFiniteScore { key: StorageKey },

    #[error("invalid key pattern: {0}")]
    InvalidPattern(String),

    #[error("store lock poisoned by a panicked caller")]
    Poisoned,

    #[error("couldn't start the expiry sweeper: {0}")]
    SweeperSpawn(String),
}

/// Errors related to working with [`crate::cmd`]
#[derive(Debug, Error)]
pub enum CmdError {
    #[error(transparent)]
    StoreError(#[from] StoreError),

    #[error("Unrecognized command: {0}")]
    UnrecognizedCmd(String),

    #[error("Wrong number of arguments for '{0}'")]
    WrongArity(String),

    #[error("Couldn't parse {0} to integer")]
    IntegerParseError(String),

    #[error("Couldn't parse {0} to float")]
    FloatParseError(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("EXEC without MULTI")]
    ExecWithoutMulti,

    #[error("DISCARD without MULTI")]
    DiscardWithoutMulti,

    #[error("MULTI calls can not be nested")]
    NestedMulti,
}

/// Checks that a key is usable
pub(crate) fn check_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        Err(StoreError::EmptyKey)
    } else {
        Ok(())
    }
}

/// Checks that a hash field name is usable
pub(crate) fn check_field(field: &str) -> Result<(), StoreError> {
    if field.is_empty() {
        Err(StoreError::EmptyField)
    } else {
        Ok(())
    }
}

/// Checks that a numeric argument is a finite number
pub(crate) fn check_finite(name: &'static str, x: f64) -> Result<(), StoreError> {
    if x.is_finite() {
        Ok(())
    } else {
        Err(StoreError::NonFinite { name })
    }
}

/// Checks that a numeric argument is a number at all; infinities are accepted as range bounds
pub(crate) fn check_not_nan(name: &'static str, x: f64) -> Result<(), StoreError> {
    if x.is_nan() {
        Err(StoreError::NotANumber { name })
    } else {
        Ok(())
    }
}

/// Checks that a seconds argument isn't negative
pub(crate) fn check_non_negative(name: &'static str, x: i64) -> Result<(), StoreError> {
    if x < 0 {
        Err(StoreError::Negative { name })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn store_failure_with_context_becomes_application_error() {
        let err: ApplicationError = Err::<(), _>(StoreError::NotConnected)
            .context("Couldn't open the store")
            .unwrap_err()
            .into();
        assert!(matches!(err, ApplicationError::Other(_)));
        assert_eq!("Couldn't open the store", err.to_string());
    }

    #[test]
    fn validators() {
        assert_eq!(Err(StoreError::EmptyKey), check_key(""));
        assert_eq!(Err(StoreError::EmptyField), check_field(""));
        assert_eq!(
            Err(StoreError::NonFinite { name: "score" }),
            check_finite("score", f64::INFINITY)
        );
        assert_eq!(Ok(()), check_not_nan("max", f64::INFINITY));
        assert_eq!(
            Err(StoreError::Negative { name: "ttl" }),
            check_non_negative("ttl", -1)
        );
    }
}
