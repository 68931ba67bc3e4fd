//! Migration definitions and persisted migration records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::action::MigrationAction;
use crate::migration_name::MigrationName;
use crate::status::{Direction, MigrationStatus};

/// Body of one migration direction
#[derive(Clone)]
pub enum MigrationBody {
    /// Raw statement text executed verbatim by the store
    Sql(String),
    /// Runnable action (external script or registered function)
    Action(Arc<dyn MigrationAction>),
}

impl MigrationBody {
    /// An empty SQL body supplies nothing; merging and execution skip it
    pub fn is_empty(&self) -> bool {
        match self {
            MigrationBody::Sql(sql) => sql.trim().is_empty(),
            MigrationBody::Action(_) => false,
        }
    }
}

impl fmt::Debug for MigrationBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationBody::Sql(sql) => f.debug_tuple("Sql").field(sql).finish(),
            MigrationBody::Action(action) => f.debug_tuple("Action").field(action).finish(),
        }
    }
}

/// One versioned schema-change unit, as known to the registry for a single run
#[derive(Debug, Clone)]
pub struct Migration {
    /// 1-based position in the ordered sequence
    pub version: u32,
    pub name: MigrationName,
    pub up: Option<MigrationBody>,
    pub down: Option<MigrationBody>,
}

impl Migration {
    pub fn new(version: u32, name: MigrationName) -> Self {
        Self {
            version,
            name,
            up: None,
            down: None,
        }
    }

    /// Body for `direction`, if one was supplied
    pub fn body(&self, direction: Direction) -> Option<&MigrationBody> {
        match direction {
            Direction::Up => self.up.as_ref(),
            Direction::Down => self.down.as_ref(),
        }
    }

    /// Build a history record for this migration in `status`, stamped now
    pub fn record(&self, status: MigrationStatus) -> MigrationRecord {
        MigrationRecord::new(self.version, self.name.clone(), status)
    }
}

/// Durable record of a migration's most recent status transition
///
/// Records are identified by the `(version, name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub version: u32,
    pub name: MigrationName,
    pub status: MigrationStatus,
    pub status_changed_at: DateTime<Utc>,
}

impl MigrationRecord {
    /// Create a record stamped with the current time
    pub fn new(version: u32, name: MigrationName, status: MigrationStatus) -> Self {
        Self {
            version,
            name,
            status,
            status_changed_at: Utc::now(),
        }
    }
}
