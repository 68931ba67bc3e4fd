//! Fragment identifiers: `<version>_<name>_<direction>.<kind>`.
//!
//! `00001_create_users_up.sql` is the up half of version 1, named
//! `create_users`, holding raw SQL. A `.sh` kind marks an executable script.

use std::fmt;
use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};
use crate::migration_name::MigrationName;
use crate::status::Direction;

/// What a fragment's contents are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// Raw statement text (`.sql`)
    Sql,
    /// Executable script run as an external process (`.sh`)
    Script,
}

impl FragmentKind {
    pub fn extension(&self) -> &'static str {
        match self {
            FragmentKind::Sql => "sql",
            FragmentKind::Script => "sh",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "sql" => Some(FragmentKind::Sql),
            "sh" => Some(FragmentKind::Script),
            _ => None,
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Parsed fragment identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentName {
    pub version: u32,
    pub name: MigrationName,
    pub direction: Direction,
    pub kind: FragmentKind,
}

impl FragmentName {
    pub fn new(version: u32, name: MigrationName, direction: Direction, kind: FragmentKind) -> Self {
        Self {
            version,
            name,
            direction,
            kind,
        }
    }

    /// Parse an identifier such as `00002_add_index_down.sql`.
    pub fn parse(identifier: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidMigrationName {
            name: identifier.to_string(),
            reason: reason.to_string(),
        };

        let digits_end = identifier
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(identifier.len());
        if digits_end == 0 {
            return Err(invalid("must start with a decimal version number"));
        }
        let version: u32 = identifier[..digits_end]
            .parse()
            .map_err(|_| invalid("version number is out of range"))?;
        if version == 0 {
            return Err(invalid("version numbers start at 1"));
        }

        let (stem, ext) = identifier
            .rsplit_once('.')
            .ok_or_else(|| invalid("missing '.sql' or '.sh' extension"))?;
        let kind = FragmentKind::from_extension(ext)
            .ok_or_else(|| invalid("extension must be '.sql' or '.sh'"))?;

        let rest = stem[digits_end..]
            .strip_prefix('_')
            .ok_or_else(|| invalid("expected '_' after the version number"))?;
        let (name, direction) = rest
            .rsplit_once('_')
            .ok_or_else(|| invalid("expected <version>_<name>_<up|down>"))?;
        let direction = match direction {
            "up" => Direction::Up,
            "down" => Direction::Down,
            _ => return Err(invalid("direction must be 'up' or 'down'")),
        };
        let name = MigrationName::try_new(name)
            .ok_or_else(|| invalid("name must be non-empty"))?;

        Ok(Self::new(version, name, direction, kind))
    }

    /// Canonical file name, with the version zero-padded to five digits
    pub fn file_name(&self) -> String {
        format!(
            "{:05}_{}_{}.{}",
            self.version,
            self.name,
            self.direction,
            self.kind.extension()
        )
    }
}

/// A discovered script fragment, already read by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFragment {
    /// File-name-equivalent identifier
    pub identifier: String,
    /// Raw contents (unused for executable scripts)
    pub contents: String,
    /// Location of the script, used to run executable fragments
    pub path: Option<PathBuf>,
}

impl ScriptFragment {
    pub fn new(identifier: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            contents: contents.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Path used to run the fragment; falls back to the identifier
    pub fn script_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.identifier))
    }
}

/// Leading decimal version of an identifier, if it has one
pub fn leading_version(identifier: &str) -> Option<u32> {
    let digits_end = identifier
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(identifier.len());
    identifier[..digits_end].parse().ok()
}

#[cfg(test)]
#[path = "fragment_test.rs"]
mod tests;
