//! Per-migration lifecycle states and the legal transitions between them.
//!
//! A version with no persisted record has never been attempted. Every
//! attempt is persisted as two writes: a transient state (`Process` or
//! `Cancellation`) before the side effect runs, and a terminal state
//! (`Success`, `Cancel` or `Error`) once it finishes. A record left in a
//! transient state means a run died mid-execution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Persisted status of one migration's most recent attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    /// Up in flight
    Process,
    /// Up completed
    Success,
    /// Down in flight
    Cancellation,
    /// Down completed
    Cancel,
    /// Either direction failed
    Error,
}

impl MigrationStatus {
    /// All states, in lifecycle order
    pub const ALL: [MigrationStatus; 5] = [
        MigrationStatus::Process,
        MigrationStatus::Success,
        MigrationStatus::Cancellation,
        MigrationStatus::Cancel,
        MigrationStatus::Error,
    ];

    /// Stable lowercase identifier used for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Process => "process",
            MigrationStatus::Success => "success",
            MigrationStatus::Cancellation => "cancellation",
            MigrationStatus::Cancel => "cancel",
            MigrationStatus::Error => "error",
        }
    }

    /// Whether a side effect is (or was, if the run crashed) in flight
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MigrationStatus::Process | MigrationStatus::Cancellation
        )
    }

    /// Whether moving from `current` (None = never attempted) to `self` is legal
    pub fn can_follow(self, current: Option<MigrationStatus>) -> bool {
        use MigrationStatus::*;
        match self {
            Process => matches!(current, None | Some(Cancel) | Some(Error)),
            Cancellation => matches!(current, Some(Success) | Some(Error)),
            Success => current == Some(Process),
            Cancel => current == Some(Cancellation),
            Error => matches!(current, Some(Process) | Some(Cancellation)),
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MigrationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown migration status '{s}'"))
    }
}

/// Direction of a migration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply
    Up,
    /// Revert
    Down,
}

impl Direction {
    /// Status written before the body runs
    pub fn in_flight(&self) -> MigrationStatus {
        match self {
            Direction::Up => MigrationStatus::Process,
            Direction::Down => MigrationStatus::Cancellation,
        }
    }

    /// Status written after the body succeeds
    pub fn completed(&self) -> MigrationStatus {
        match self {
            Direction::Up => MigrationStatus::Success,
            Direction::Down => MigrationStatus::Cancel,
        }
    }

    /// Status written after the body fails
    pub fn failed(&self) -> MigrationStatus {
        MigrationStatus::Error
    }

    /// Fragment-name segment for this direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
