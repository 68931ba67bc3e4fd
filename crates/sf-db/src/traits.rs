//! Migration store trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use sf_core::{MigrationRecord, MigrationStatus};

/// Durable store the migration engine runs against.
///
/// Implementations own the cross-run migration history and the store-wide
/// exclusion lock. They must be Send + Sync for async operation.
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// Open the underlying connection and prepare the history and lock tables
    async fn connect(&self) -> DbResult<()>;

    /// Release the connection. Safe to call when `connect` failed or never ran.
    async fn close(&self) -> DbResult<()>;

    /// Acquire the store-wide migration lock.
    ///
    /// Fails with [`DbError::LockContention`](crate::DbError::LockContention)
    /// if another holder is active.
    async fn lock(&self) -> DbResult<()>;

    /// Release the migration lock if this store holds it
    async fn unlock(&self) -> DbResult<()>;

    /// Clear the migration lock whoever holds it, returning the previous holder.
    ///
    /// Recovery for a run that died without unlocking.
    async fn force_unlock(&self) -> DbResult<Option<String>>;

    /// Execute one raw statement body
    async fn migrate(&self, sql: &str) -> DbResult<()>;

    /// Record a migration's status, upserting by `(version, name)`.
    ///
    /// An update keeps the record's original insertion position. A record for
    /// the same version under a different name is rejected with
    /// [`DbError::NameConflict`](crate::DbError::NameConflict).
    async fn insert_or_update_migration(&self, record: &MigrationRecord) -> DbResult<()>;

    /// All records in insertion order; `NotFound` when there are none
    async fn select_migrations(&self) -> DbResult<Vec<MigrationRecord>>;

    /// The last record in insertion order with `status`; `NotFound` when none match
    async fn select_last_migration_by_status(
        &self,
        status: MigrationStatus,
    ) -> DbResult<MigrationRecord>;

    /// Connection target, passed to executable migrations
    fn target(&self) -> Option<String> {
        None
    }

    /// Store type identifier for logging
    fn db_type(&self) -> &'static str;
}
