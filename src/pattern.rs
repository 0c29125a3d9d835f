//! # Key Patterns
//!
//! Glob-style key patterns, as used by [`keys`](crate::storage::Storage::keys)
//! and [`clear`](crate::storage::Storage::clear):
//! - `*` matches any run of characters, including an empty one,
//! - `?` matches exactly one character,
//! - every other character matches itself literally, so `user.name` doesn't match `userXname`.

use crate::errors::StoreError;
use regex::Regex;

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
}

impl KeyPattern {
    /// Compiles a glob pattern into an anchored regular expression.
    ///
    /// All regex metacharacters outside of `*` and `?` are escaped first.
    /// Fails only if the compiled expression exceeds the regex size limits.
    pub fn new(pattern: &str) -> Result<Self, StoreError> {
        let mut source = String::with_capacity(pattern.len() * 2 + 6);
        source.push_str("(?s)^");
        let mut literal = [0u8; 4];
        for c in pattern.chars() {
            match c {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                c => source.push_str(&regex::escape(c.encode_utf8(&mut literal))),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| StoreError::InvalidPattern(e.to_string()))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}
