//! Error types for sf-migrate

use sf_core::{ActionError, Direction, MigrationStatus};
use sf_db::DbError;
use thiserror::Error;

/// Why a single migration step failed
#[derive(Error, Debug)]
pub enum StepError {
    /// The recorded status does not allow entering the next state
    #[error("cannot move from {from} to '{to}'; fix the history record before retrying")]
    InvalidTransition { from: String, to: MigrationStatus },

    /// History holds this version under a different name
    #[error("version is recorded under the name '{recorded}'")]
    NameConflict { recorded: String },

    /// A status write failed
    #[error("failed to record status: {0}")]
    Record(#[source] DbError),

    /// The SQL body failed
    #[error("SQL body failed: {0}")]
    Sql(#[source] DbError),

    /// The executable body failed
    #[error("script body failed: {0}")]
    Action(#[source] ActionError),
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// G001: Connection setup failed
    #[error("[G001] Failed to connect to the migration store: {0}")]
    Connection(#[source] DbError),

    /// G002: The exclusion lock could not be acquired
    #[error("[G002] Failed to acquire the migration lock: {0}")]
    Lock(#[source] DbError),

    /// G003: Migration history could not be read
    #[error("[G003] Failed to read migration history: {0}")]
    History(#[source] DbError),

    /// G004: Recorded version is beyond the migrations on disk
    #[error("[G004] Database is at version {recorded} but only {known} migrations are known")]
    VersionMismatch { recorded: u32, known: usize },

    /// G005: An up migration failed; later migrations were not attempted
    #[error("[G005] Up migration failed at version {version} ({name}): {source}")]
    UpFailed {
        version: u32,
        name: String,
        source: StepError,
    },

    /// G006: A down migration failed
    #[error("[G006] Down migration failed at version {version} ({name}): {source}")]
    DownFailed {
        version: u32,
        name: String,
        source: StepError,
    },

    /// G007: Redo failed while rolling back or re-applying
    #[error("[G007] Redo failed during {stage} of version {version} ({name}): {source}")]
    RedoFailed {
        version: u32,
        name: String,
        stage: Direction,
        source: StepError,
    },
}

/// Coarse classification for callers deciding what to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Another run holds the lock; retry later
    LockContention,
    /// Scripts on disk and recorded history disagree
    Drift,
    /// A migration failed mid-run; history shows where
    PartialProgress,
    /// The store itself failed
    Storage,
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;

impl MigrateError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MigrateError::Lock(DbError::LockContention { .. }) => FailureKind::LockContention,
            MigrateError::Lock(_) | MigrateError::Connection(_) | MigrateError::History(_) => {
                FailureKind::Storage
            }
            MigrateError::VersionMismatch { .. } => FailureKind::Drift,
            MigrateError::UpFailed { source, .. }
            | MigrateError::DownFailed { source, .. }
            | MigrateError::RedoFailed { source, .. } => match source {
                StepError::NameConflict { .. } => FailureKind::Drift,
                StepError::Record(DbError::NameConflict { .. }) => FailureKind::Drift,
                _ => FailureKind::PartialProgress,
            },
        }
    }

    pub fn is_lock_contention(&self) -> bool {
        self.kind() == FailureKind::LockContention
    }
}
