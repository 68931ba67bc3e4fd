//! In-memory migration store.
//!
//! Keeps history and the lock in process memory. Handles created with
//! [`MemoryStore::handle`] share the same state but carry their own lock
//! holder id, which models several engine instances pointed at one store.

use crate::error::{DbError, DbResult};
use crate::traits::MigrationStore;
use async_trait::async_trait;
use sf_core::{MigrationRecord, MigrationStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct SharedState {
    records: Vec<MigrationRecord>,
    lock_holder: Option<String>,
    executed: Vec<String>,
    failing_pattern: Option<String>,
}

/// Migration store backed by process memory
#[derive(Debug)]
pub struct MemoryStore {
    holder: String,
    connected: AtomicBool,
    state: Arc<Mutex<SharedState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            holder: Uuid::new_v4().to_string(),
            connected: AtomicBool::new(false),
            state: Arc::new(Mutex::new(SharedState::default())),
        }
    }

    /// A second store sharing this one's history and lock
    pub fn handle(&self) -> Self {
        Self {
            holder: Uuid::new_v4().to_string(),
            connected: AtomicBool::new(false),
            state: Arc::clone(&self.state),
        }
    }

    /// Lock holder id used by this handle
    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Make every statement containing `pattern` fail on `migrate`
    pub fn fail_statements_containing(&self, pattern: impl Into<String>) -> DbResult<()> {
        self.state()?.failing_pattern = Some(pattern.into());
        Ok(())
    }

    /// Statements executed through `migrate`, in order
    pub fn executed_statements(&self) -> DbResult<Vec<String>> {
        Ok(self.state()?.executed.clone())
    }

    /// Snapshot of the history, possibly empty
    pub fn records(&self) -> DbResult<Vec<MigrationRecord>> {
        Ok(self.state()?.records.clone())
    }

    /// Current lock holder, if any
    pub fn lock_holder(&self) -> DbResult<Option<String>> {
        Ok(self.state()?.lock_holder.clone())
    }

    fn state(&self) -> DbResult<MutexGuard<'_, SharedState>> {
        self.state
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn connected_state(&self) -> DbResult<MutexGuard<'_, SharedState>> {
        if !self.is_connected() {
            return Err(DbError::NotConnected);
        }
        self.state()
    }
}

#[async_trait]
impl MigrationStore for MemoryStore {
    async fn connect(&self) -> DbResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> DbResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn lock(&self) -> DbResult<()> {
        let mut state = self.connected_state()?;
        match &state.lock_holder {
            Some(holder) => Err(DbError::LockContention {
                holder: holder.clone(),
            }),
            None => {
                state.lock_holder = Some(self.holder.clone());
                Ok(())
            }
        }
    }

    async fn unlock(&self) -> DbResult<()> {
        let mut state = self.connected_state()?;
        if state.lock_holder.as_deref() == Some(self.holder.as_str()) {
            state.lock_holder = None;
        } else {
            log::warn!("Migration lock was not held by this store ({})", self.holder);
        }
        Ok(())
    }

    async fn force_unlock(&self) -> DbResult<Option<String>> {
        Ok(self.connected_state()?.lock_holder.take())
    }

    async fn migrate(&self, sql: &str) -> DbResult<()> {
        let mut state = self.connected_state()?;
        if let Some(pattern) = &state.failing_pattern {
            if sql.contains(pattern.as_str()) {
                return Err(DbError::ExecutionError(format!(
                    "statement rejected: {sql}"
                )));
            }
        }
        state.executed.push(sql.to_string());
        Ok(())
    }

    async fn insert_or_update_migration(&self, record: &MigrationRecord) -> DbResult<()> {
        let mut state = self.connected_state()?;
        match state
            .records
            .iter_mut()
            .find(|existing| existing.version == record.version)
        {
            Some(existing) if existing.name != record.name => Err(DbError::NameConflict {
                version: record.version,
                existing: existing.name.to_string(),
                incoming: record.name.to_string(),
            }),
            Some(existing) => {
                existing.status = record.status;
                existing.status_changed_at = record.status_changed_at;
                Ok(())
            }
            None => {
                state.records.push(record.clone());
                Ok(())
            }
        }
    }

    async fn select_migrations(&self) -> DbResult<Vec<MigrationRecord>> {
        let state = self.connected_state()?;
        if state.records.is_empty() {
            return Err(DbError::NotFound("migration history is empty".to_string()));
        }
        Ok(state.records.clone())
    }

    async fn select_last_migration_by_status(
        &self,
        status: MigrationStatus,
    ) -> DbResult<MigrationRecord> {
        let state = self.connected_state()?;
        state
            .records
            .iter()
            .rev()
            .find(|record| record.status == status)
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("no migration with status '{status}'")))
    }

    fn db_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::MigrationName;

    fn record(version: u32, name: &str, status: MigrationStatus) -> MigrationRecord {
        MigrationRecord::new(version, MigrationName::new(name), status)
    }

    #[tokio::test]
    async fn test_requires_connect() {
        let store = MemoryStore::new();
        let err = store.lock().await.unwrap_err();
        assert!(matches!(err, DbError::NotConnected));
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_keeps_insertion_position() {
        let store = MemoryStore::new();
        store.connect().await.unwrap();
        store
            .insert_or_update_migration(&record(1, "a", MigrationStatus::Success))
            .await
            .unwrap();
        store
            .insert_or_update_migration(&record(2, "b", MigrationStatus::Success))
            .await
            .unwrap();
        store
            .insert_or_update_migration(&record(1, "a", MigrationStatus::Cancel))
            .await
            .unwrap();

        let records = store.select_migrations().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].version, 1);
        assert_eq!(records[0].status, MigrationStatus::Cancel);

        let last = store
            .select_last_migration_by_status(MigrationStatus::Success)
            .await
            .unwrap();
        assert_eq!(last.version, 2);
    }

    #[tokio::test]
    async fn test_name_conflict_is_rejected() {
        let store = MemoryStore::new();
        store.connect().await.unwrap();
        store
            .insert_or_update_migration(&record(1, "create_users", MigrationStatus::Success))
            .await
            .unwrap();

        let err = store
            .insert_or_update_migration(&record(1, "create_people", MigrationStatus::Process))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NameConflict { version: 1, .. }));
        assert_eq!(store.records().unwrap()[0].status, MigrationStatus::Success);
    }

    #[tokio::test]
    async fn test_empty_history_is_not_found() {
        let store = MemoryStore::new();
        store.connect().await.unwrap();
        assert!(store.select_migrations().await.unwrap_err().is_not_found());
        assert!(store
            .select_last_migration_by_status(MigrationStatus::Success)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_lock_is_shared_between_handles() {
        let first = MemoryStore::new();
        let second = first.handle();
        first.connect().await.unwrap();
        second.connect().await.unwrap();

        first.lock().await.unwrap();
        let err = second.lock().await.unwrap_err();
        assert!(matches!(err, DbError::LockContention { ref holder } if holder == first.holder()));

        // A non-holder cannot release someone else's lock
        second.unlock().await.unwrap();
        assert_eq!(first.lock_holder().unwrap().as_deref(), Some(first.holder()));

        first.unlock().await.unwrap();
        second.lock().await.unwrap();
        assert_eq!(
            second.lock_holder().unwrap().as_deref(),
            Some(second.holder())
        );
    }

    #[tokio::test]
    async fn test_failing_pattern_rejects_statement() {
        let store = MemoryStore::new();
        store.connect().await.unwrap();
        store.fail_statements_containing("BROKEN").unwrap();

        store.migrate("CREATE TABLE ok (id INT)").await.unwrap();
        let err = store.migrate("BROKEN SQL").await.unwrap_err();
        assert!(matches!(err, DbError::ExecutionError(_)));
        assert_eq!(
            store.executed_statements().unwrap(),
            vec!["CREATE TABLE ok (id INT)".to_string()]
        );
    }

    #[tokio::test]
    async fn test_force_unlock_clears_any_holder() {
        let first = MemoryStore::new();
        first.connect().await.unwrap();
        first.lock().await.unwrap();
        let second = first.handle();
        second.connect().await.unwrap();

        assert_eq!(
            second.force_unlock().await.unwrap().as_deref(),
            Some(first.holder())
        );
        assert_eq!(second.force_unlock().await.unwrap(), None);
        second.lock().await.unwrap();
    }
}
