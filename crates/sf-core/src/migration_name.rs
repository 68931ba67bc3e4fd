//! Strongly-typed migration name wrapper.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Human-readable identifier of a migration, shared by its up and down halves.
///
/// Any non-empty text that can sit inside a file name is accepted, since
/// discovered fragments may carry names like `users.v2`. Names for newly
/// scaffolded migrations are further restricted, see
/// [`is_identifier`](Self::is_identifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MigrationName(String);

impl MigrationName {
    /// Try to create a new `MigrationName`, returning `None` if the name is
    /// empty or contains a path separator or control character.
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if Self::is_valid(&s) {
            Some(Self(s))
        } else {
            None
        }
    }

    /// Create a new `MigrationName`, panicking if the name is invalid.
    ///
    /// Prefer [`try_new`](Self::try_new) when handling untrusted input.
    pub fn new(name: impl Into<String>) -> Self {
        let s = name.into();
        assert!(Self::is_valid(&s), "invalid MigrationName '{s}'");
        Self(s)
    }

    /// Check whether `s` is acceptable as a migration name.
    pub fn is_valid(s: &str) -> bool {
        !s.is_empty() && !s.chars().any(|c| c == '/' || c == '\\' || c.is_control())
    }

    /// Whether the name uses only ASCII letters, digits, `_` and `-`.
    pub fn is_identifier(&self) -> bool {
        self.0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for MigrationName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MigrationName {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(format!("invalid migration name '{s}'"))
        }
    }
}

impl From<MigrationName> for String {
    fn from(name: MigrationName) -> Self {
        name.0
    }
}

impl PartialEq<str> for MigrationName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
