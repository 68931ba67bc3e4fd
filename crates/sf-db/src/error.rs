//! Error types for sf-db

use thiserror::Error;

/// Migration store errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Operation attempted before `connect` (D002)
    #[error("[D002] Database is not connected")]
    NotConnected,

    /// Statement execution error (D003)
    #[error("[D003] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Another run holds the migration lock (D004)
    #[error("[D004] Migration lock is held by {holder}")]
    LockContention { holder: String },

    /// No matching migration record (D005)
    #[error("[D005] No migration record found: {0}")]
    NotFound(String),

    /// A record exists for this version under a different name (D006)
    #[error("[D006] Version {version} is recorded as '{existing}', refusing to record it as '{incoming}'")]
    NameConflict {
        version: u32,
        existing: String,
        incoming: String,
    },

    /// Stored row could not be decoded (D007)
    #[error("[D007] Corrupt migration record: {0}")]
    CorruptRecord(String),

    /// Mutex poisoned (D008)
    #[error("[D008] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

impl DbError {
    /// Whether this error means "nothing matched" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}
