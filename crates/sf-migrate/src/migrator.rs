//! Up/down/redo orchestration over a migration store.
//!
//! Write-bearing operations hold the store-wide lock for their whole
//! duration. Each migration step persists its transient state before the body
//! runs and its terminal state after, so a crash leaves the migration visibly
//! stuck in `process` or `cancellation`.

use std::collections::HashMap;
use std::sync::Arc;

use sf_core::{
    ActionContext, Direction, Migration, MigrationBody, MigrationRecord, MigrationStatus, Registry,
};
use sf_db::MigrationStore;

use crate::error::{MigrateError, MigrateResult, StepError};
use crate::report::StatusReport;

/// Migration engine bound to one registry and one store
pub struct Migrator {
    store: Arc<dyn MigrationStore>,
    registry: Registry,
}

impl Migrator {
    pub fn new(store: Arc<dyn MigrationStore>, registry: Registry) -> Self {
        Self { store, registry }
    }

    /// Open the store connection
    pub async fn connect(&self) -> MigrateResult<()> {
        log::info!("Connecting to {} store", self.store.db_type());
        self.store.connect().await.map_err(|e| {
            log::error!("Connection failed: {e}");
            MigrateError::Connection(e)
        })?;
        log::debug!("Connected");
        Ok(())
    }

    /// Close the store connection; failures are logged, not returned
    pub async fn close(&self) {
        if let Err(e) = self.store.close().await {
            log::error!("Failed to close the {} store: {e}", self.store.db_type());
        } else {
            log::debug!("Connection closed");
        }
    }

    /// Apply every migration after the last successful one, in order.
    ///
    /// Stops at the first failure; later migrations are left unattempted.
    /// Returns the versions applied, empty when already up to date.
    pub async fn up(&self) -> MigrateResult<Vec<u32>> {
        log::info!("Applying migrations");
        self.acquire_lock().await?;
        let result = self.up_locked().await;
        self.release_lock().await;
        result
    }

    /// Roll back the single most recent successful migration.
    ///
    /// Returns the version rolled back, or `None` when nothing has succeeded.
    pub async fn down(&self) -> MigrateResult<Option<u32>> {
        log::info!("Rolling back the last migration");
        self.acquire_lock().await?;
        let result = self.down_locked().await;
        self.release_lock().await;
        result
    }

    /// Roll back the most recent successful migration and apply it again.
    ///
    /// Returns the version redone, or `None` when nothing has succeeded.
    pub async fn redo(&self) -> MigrateResult<Option<u32>> {
        log::info!("Redoing the last migration");
        self.acquire_lock().await?;
        let result = self.redo_locked().await;
        self.release_lock().await;
        result
    }

    /// Clear a migration lock left behind by a run that died, whoever holds it.
    ///
    /// Returns the holder that was cleared, if any.
    pub async fn force_unlock(&self) -> MigrateResult<Option<String>> {
        let cleared = self.store.force_unlock().await.map_err(MigrateError::Lock)?;
        match &cleared {
            Some(holder) => log::warn!("Cleared the migration lock held by {holder}"),
            None => log::info!("Migration lock was not held"),
        }
        Ok(cleared)
    }

    /// All recorded migrations in insertion order. Does not take the lock.
    pub async fn status(&self) -> MigrateResult<StatusReport> {
        let records = match self.store.select_migrations().await {
            Ok(records) => records,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => {
                log::error!("Failed to read migration status: {e}");
                return Err(MigrateError::History(e));
            }
        };
        Ok(StatusReport::new(records))
    }

    /// Version of the last successful migration, 0 when none. Does not take the lock.
    pub async fn db_version(&self) -> MigrateResult<u32> {
        Ok(self.last_success().await?.map_or(0, |r| r.version))
    }

    async fn up_locked(&self) -> MigrateResult<Vec<u32>> {
        let last = self.last_success().await?.map_or(0, |r| r.version);
        self.check_drift(last)?;
        let history = self.history_by_version().await?;

        let mut applied = Vec::new();
        for migration in self.registry.after(last) {
            self.execute(migration, Direction::Up, history.get(&migration.version))
                .await
                .map_err(|source| {
                    log::error!("Up migration v{:05} failed: {source}", migration.version);
                    MigrateError::UpFailed {
                        version: migration.version,
                        name: migration.name.to_string(),
                        source,
                    }
                })?;
            applied.push(migration.version);
        }

        if applied.is_empty() {
            log::info!("Database is up to date at version {last}");
        } else {
            log::info!("Applied {} migration(s)", applied.len());
        }
        Ok(applied)
    }

    async fn down_locked(&self) -> MigrateResult<Option<u32>> {
        let Some(last) = self.last_success().await? else {
            log::warn!("No successful migrations to roll back");
            return Ok(None);
        };
        let migration = self.known_migration(last.version)?;

        self.execute(migration, Direction::Down, Some(&last))
            .await
            .map_err(|source| {
                log::error!("Down migration v{:05} failed: {source}", migration.version);
                MigrateError::DownFailed {
                    version: migration.version,
                    name: migration.name.to_string(),
                    source,
                }
            })?;

        log::info!("Rolled back version {}", last.version);
        Ok(Some(last.version))
    }

    async fn redo_locked(&self) -> MigrateResult<Option<u32>> {
        let Some(last) = self.last_success().await? else {
            log::warn!("No successful migrations to redo");
            return Ok(None);
        };
        let migration = self.known_migration(last.version)?;
        let redo_failed = |stage: Direction, source: StepError| {
            log::error!("Redo of v{:05} failed during {stage}: {source}", migration.version);
            MigrateError::RedoFailed {
                version: migration.version,
                name: migration.name.to_string(),
                stage,
                source,
            }
        };

        self.execute(migration, Direction::Down, Some(&last))
            .await
            .map_err(|source| redo_failed(Direction::Down, source))?;

        let rolled_back = MigrationRecord {
            status: Direction::Down.completed(),
            ..last
        };
        self.execute(migration, Direction::Up, Some(&rolled_back))
            .await
            .map_err(|source| redo_failed(Direction::Up, source))?;

        log::info!("Redid version {}", migration.version);
        Ok(Some(migration.version))
    }

    /// Run one migration in one direction, persisting both status writes.
    async fn execute(
        &self,
        migration: &Migration,
        direction: Direction,
        current: Option<&MigrationRecord>,
    ) -> Result<(), StepError> {
        if let Some(current) = current {
            if current.name != migration.name {
                return Err(StepError::NameConflict {
                    recorded: current.name.to_string(),
                });
            }
        }

        let in_flight = direction.in_flight();
        let current_status = current.map(|r| r.status);
        if !in_flight.can_follow(current_status) {
            return Err(StepError::InvalidTransition {
                from: current_status.map_or_else(|| "no record".to_string(), |s| format!("'{s}'")),
                to: in_flight,
            });
        }

        self.record(migration, in_flight).await?;

        match self.run_body(migration, direction).await {
            Ok(()) => {
                self.record(migration, direction.completed()).await?;
                log::info!(
                    "Migration {} {} to version {}",
                    migration.name,
                    match direction {
                        Direction::Up => "applied",
                        Direction::Down => "rolled back",
                    },
                    migration.version
                );
                Ok(())
            }
            Err(err) => {
                if let Err(record_err) = self.record(migration, direction.failed()).await {
                    log::error!(
                        "Failed to record error status for v{:05}: {record_err}",
                        migration.version
                    );
                }
                Err(err)
            }
        }
    }

    async fn run_body(&self, migration: &Migration, direction: Direction) -> Result<(), StepError> {
        match migration.body(direction).filter(|b| !b.is_empty()) {
            None => {
                log::warn!(
                    "Migration v{:05} {} has no {direction} body",
                    migration.version,
                    migration.name
                );
                Ok(())
            }
            Some(MigrationBody::Sql(sql)) => self.store.migrate(sql).await.map_err(StepError::Sql),
            Some(MigrationBody::Action(action)) => {
                let ctx = ActionContext {
                    version: migration.version,
                    name: migration.name.clone(),
                    direction,
                    database: self.store.target(),
                };
                action.run(&ctx).await.map_err(StepError::Action)
            }
        }
    }

    async fn record(&self, migration: &Migration, status: MigrationStatus) -> Result<(), StepError> {
        log::debug!("v{:05} {} -> {status}", migration.version, migration.name);
        self.store
            .insert_or_update_migration(&migration.record(status))
            .await
            .map_err(StepError::Record)
    }

    async fn last_success(&self) -> MigrateResult<Option<MigrationRecord>> {
        match self
            .store
            .select_last_migration_by_status(MigrationStatus::Success)
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                log::error!("Failed to read the last successful migration: {e}");
                Err(MigrateError::History(e))
            }
        }
    }

    async fn history_by_version(&self) -> MigrateResult<HashMap<u32, MigrationRecord>> {
        match self.store.select_migrations().await {
            Ok(records) => Ok(records.into_iter().map(|r| (r.version, r)).collect()),
            Err(e) if e.is_not_found() => Ok(HashMap::new()),
            Err(e) => Err(MigrateError::History(e)),
        }
    }

    fn check_drift(&self, recorded: u32) -> MigrateResult<()> {
        if recorded as usize > self.registry.len() {
            log::error!(
                "Database version {recorded} exceeds the {} known migrations",
                self.registry.len()
            );
            return Err(MigrateError::VersionMismatch {
                recorded,
                known: self.registry.len(),
            });
        }
        Ok(())
    }

    fn known_migration(&self, version: u32) -> MigrateResult<&Migration> {
        self.check_drift(version)?;
        self.registry
            .get(version)
            .ok_or(MigrateError::VersionMismatch {
                recorded: version,
                known: self.registry.len(),
            })
    }

    async fn acquire_lock(&self) -> MigrateResult<()> {
        self.store.lock().await.map_err(|e| {
            log::error!("Failed to acquire the migration lock: {e}");
            MigrateError::Lock(e)
        })
    }

    async fn release_lock(&self) {
        if let Err(e) = self.store.unlock().await {
            log::error!("Failed to release the migration lock: {e}");
        }
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
