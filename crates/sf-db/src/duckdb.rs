//! DuckDB migration store implementation

use crate::error::{DbError, DbResult};
use crate::traits::MigrationStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use sf_core::{MigrationName, MigrationRecord, MigrationStatus};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Row id of the single lock row
const LOCK_ROW_ID: i64 = 1;

/// Table names and lock policy for a [`DuckDbStore`]
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub history_table: String,
    pub lock_table: String,
    /// Locks older than this are considered abandoned and cleared on `lock`
    pub lock_timeout: Option<Duration>,
    /// Open an existing file read-only and never create tables
    pub read_only: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::from_config(&sf_core::Config::default())
    }
}

impl StoreOptions {
    /// Options taken from a loaded project config
    pub fn from_config(config: &sf_core::Config) -> Self {
        Self {
            history_table: config.history_table.clone(),
            lock_table: config.lock_table.clone(),
            lock_timeout: config.lock_timeout_secs.map(Duration::from_secs),
            read_only: false,
        }
    }

    /// Same options, opened read-only
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// DuckDB-backed migration store
///
/// History lives in `history_table`, ordered by an explicit insertion
/// sequence. The exclusion lock is a single row in `lock_table` tagged with a
/// per-store holder id.
pub struct DuckDbStore {
    path: String,
    options: StoreOptions,
    holder: String,
    conn: Mutex<Option<Connection>>,
}

impl DuckDbStore {
    /// Create a store for `path` (`:memory:` for an in-memory database).
    ///
    /// Nothing is opened until [`MigrationStore::connect`].
    pub fn new(path: impl Into<String>, options: StoreOptions) -> Self {
        Self {
            path: path.into(),
            options,
            holder: Uuid::new_v4().to_string(),
            conn: Mutex::new(None),
        }
    }

    /// Open a second handle on the same database with its own lock holder id.
    ///
    /// Behaves like an independent engine instance pointed at the same store.
    pub fn try_clone(&self) -> DbResult<Self> {
        let conn = self.with_conn(|conn| {
            conn.try_clone()
                .map_err(|e| DbError::ConnectionError(e.to_string()))
        })?;
        Ok(Self {
            path: self.path.clone(),
            options: self.options.clone(),
            holder: Uuid::new_v4().to_string(),
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Lock holder id written by this store
    pub fn holder(&self) -> &str {
        &self.holder
    }

    fn open(&self) -> DbResult<Connection> {
        let conn = if self.path == ":memory:" {
            Connection::open_in_memory()
        } else if self.options.read_only {
            duckdb::Config::default()
                .access_mode(duckdb::AccessMode::ReadOnly)
                .and_then(|config| Connection::open_with_flags(Path::new(&self.path), config))
        } else {
            Connection::open(Path::new(&self.path))
        };
        conn.map_err(|e| DbError::ConnectionError(format!("{}: {}", e, self.path)))
    }

    fn with_conn<T>(&self, body: impl FnOnce(&Connection) -> DbResult<T>) -> DbResult<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        let conn = guard.as_ref().ok_or(DbError::NotConnected)?;
        body(conn)
    }

    /// Connect synchronously and ensure both tables exist
    fn connect_sync(&self) -> DbResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        if guard.is_some() {
            return Ok(());
        }

        let conn = self.open()?;
        if self.options.read_only {
            *guard = Some(conn);
            return Ok(());
        }
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {history} (
                 seq               BIGINT  NOT NULL,
                 version           BIGINT  NOT NULL PRIMARY KEY,
                 name              VARCHAR NOT NULL,
                 status            VARCHAR NOT NULL,
                 status_changed_at BIGINT  NOT NULL
             );
             CREATE TABLE IF NOT EXISTS {lock} (
                 id          BIGINT  NOT NULL PRIMARY KEY,
                 holder      VARCHAR NOT NULL,
                 acquired_at BIGINT  NOT NULL
             );",
            history = self.options.history_table,
            lock = self.options.lock_table,
        ))
        .map_err(|e| DbError::ConnectionError(format!("failed to create tables: {e}")))?;

        *guard = Some(conn);
        Ok(())
    }

    fn close_sync(&self) -> DbResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        if let Some(conn) = guard.take() {
            conn.close()
                .map_err(|(_, e)| DbError::ConnectionError(format!("close failed: {e}")))?;
        }
        Ok(())
    }

    fn lock_sync(&self) -> DbResult<()> {
        let lock_table = &self.options.lock_table;
        self.with_conn(|conn| {
            let now = Utc::now().timestamp_micros();

            if let Some(timeout) = self.options.lock_timeout {
                let cutoff = now - i64::try_from(timeout.as_micros()).unwrap_or(i64::MAX);
                let cleared = conn.execute(
                    &format!("DELETE FROM {lock_table} WHERE id = ? AND acquired_at < ?"),
                    params![LOCK_ROW_ID, cutoff],
                )?;
                if cleared > 0 {
                    log::warn!("Cleared a stale migration lock older than {:?}", timeout);
                }
            }

            let inserted = conn.execute(
                &format!("INSERT INTO {lock_table} (id, holder, acquired_at) VALUES (?, ?, ?)"),
                params![LOCK_ROW_ID, self.holder, now],
            );
            match inserted {
                Ok(_) => Ok(()),
                Err(insert_err) => {
                    let current = conn.query_row(
                        &format!("SELECT holder FROM {lock_table} WHERE id = ?"),
                        params![LOCK_ROW_ID],
                        |row| row.get::<_, String>(0),
                    );
                    match current {
                        Ok(holder) => Err(DbError::LockContention { holder }),
                        Err(_) => Err(DbError::ExecutionError(format!(
                            "failed to acquire migration lock: {insert_err}"
                        ))),
                    }
                }
            }
        })
    }

    fn unlock_sync(&self) -> DbResult<()> {
        self.with_conn(|conn| {
            let released = conn.execute(
                &format!(
                    "DELETE FROM {} WHERE id = ? AND holder = ?",
                    self.options.lock_table
                ),
                params![LOCK_ROW_ID, self.holder],
            )?;
            if released == 0 {
                log::warn!("Migration lock was not held by this store ({})", self.holder);
            }
            Ok(())
        })
    }

    fn force_unlock_sync(&self) -> DbResult<Option<String>> {
        let lock_table = &self.options.lock_table;
        self.with_conn(|conn| {
            let holder = conn.query_row(
                &format!("SELECT holder FROM {lock_table} WHERE id = ?"),
                params![LOCK_ROW_ID],
                |row| row.get::<_, String>(0),
            );
            match holder {
                Ok(holder) => {
                    conn.execute(
                        &format!("DELETE FROM {lock_table} WHERE id = ?"),
                        params![LOCK_ROW_ID],
                    )?;
                    Ok(Some(holder))
                }
                Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Read-only stores never create the history table, so it may be absent
    fn history_missing(&self, conn: &Connection) -> DbResult<bool> {
        if !self.options.read_only {
            return Ok(false);
        }
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            params![self.options.history_table],
            |row| row.get(0),
        )?;
        Ok(count == 0)
    }

    fn migrate_sync(&self, sql: &str) -> DbResult<()> {
        self.with_conn(|conn| {
            conn.execute_batch(sql)
                .map_err(|e| DbError::ExecutionError(e.to_string()))
        })
    }

    fn upsert_sync(&self, record: &MigrationRecord) -> DbResult<()> {
        let history = &self.options.history_table;
        self.with_conn(|conn| {
            conn.execute_batch("BEGIN TRANSACTION")?;
            let result = upsert_in_transaction(conn, history, record);
            match &result {
                Ok(_) => {
                    if let Err(commit_err) = conn.execute_batch("COMMIT") {
                        let _ = conn.execute_batch("ROLLBACK");
                        return Err(DbError::ExecutionError(format!(
                            "COMMIT failed: {commit_err}"
                        )));
                    }
                }
                Err(_) => {
                    let _ = conn.execute_batch("ROLLBACK");
                }
            }
            result
        })
    }

    fn select_all_sync(&self) -> DbResult<Vec<MigrationRecord>> {
        self.with_conn(|conn| {
            if self.history_missing(conn)? {
                return Ok(Vec::new());
            }
            let mut stmt = conn.prepare(&format!(
                "SELECT version, name, status, status_changed_at FROM {} ORDER BY seq",
                self.options.history_table
            ))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(decode_record).collect()
        })
    }

    fn select_last_by_status_sync(&self, status: MigrationStatus) -> DbResult<MigrationRecord> {
        self.with_conn(|conn| {
            if self.history_missing(conn)? {
                return Err(DbError::NotFound("migration history is empty".to_string()));
            }
            let row = conn.query_row(
                &format!(
                    "SELECT version, name, status, status_changed_at FROM {}
                     WHERE status = ? ORDER BY seq DESC LIMIT 1",
                    self.options.history_table
                ),
                params![status.as_str()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            );
            match row {
                Ok(row) => decode_record(row),
                Err(duckdb::Error::QueryReturnedNoRows) => Err(DbError::NotFound(format!(
                    "no migration with status '{status}'"
                ))),
                Err(e) => Err(e.into()),
            }
        })
    }
}

fn upsert_in_transaction(
    conn: &Connection,
    history: &str,
    record: &MigrationRecord,
) -> DbResult<()> {
    let version = i64::from(record.version);
    let changed_at = record.status_changed_at.timestamp_micros();

    let existing = conn.query_row(
        &format!("SELECT name FROM {history} WHERE version = ?"),
        params![version],
        |row| row.get::<_, String>(0),
    );
    match existing {
        Ok(name) if name != record.name.as_str() => Err(DbError::NameConflict {
            version: record.version,
            existing: name,
            incoming: record.name.to_string(),
        }),
        Ok(_) => {
            conn.execute(
                &format!(
                    "UPDATE {history} SET status = ?, status_changed_at = ?
                     WHERE version = ? AND name = ?"
                ),
                params![record.status.as_str(), changed_at, version, record.name.as_str()],
            )?;
            Ok(())
        }
        Err(duckdb::Error::QueryReturnedNoRows) => {
            let seq: i64 = conn.query_row(
                &format!("SELECT COALESCE(MAX(seq), 0) + 1 FROM {history}"),
                [],
                |row| row.get(0),
            )?;
            conn.execute(
                &format!(
                    "INSERT INTO {history} (seq, version, name, status, status_changed_at)
                     VALUES (?, ?, ?, ?, ?)"
                ),
                params![seq, version, record.name.as_str(), record.status.as_str(), changed_at],
            )?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn decode_record(
    (version, name, status, changed_at): (i64, String, String, i64),
) -> DbResult<MigrationRecord> {
    let version = u32::try_from(version)
        .map_err(|_| DbError::CorruptRecord(format!("version {version} out of range")))?;
    let name = MigrationName::try_new(name.clone())
        .ok_or_else(|| DbError::CorruptRecord(format!("invalid name '{name}'")))?;
    let status = status.parse::<MigrationStatus>().map_err(DbError::CorruptRecord)?;
    let status_changed_at = DateTime::<Utc>::from_timestamp_micros(changed_at).ok_or_else(|| {
        DbError::CorruptRecord(format!("invalid timestamp {changed_at} for version {version}"))
    })?;
    Ok(MigrationRecord {
        version,
        name,
        status,
        status_changed_at,
    })
}

#[async_trait]
impl MigrationStore for DuckDbStore {
    async fn connect(&self) -> DbResult<()> {
        self.connect_sync()
    }

    async fn close(&self) -> DbResult<()> {
        self.close_sync()
    }

    async fn lock(&self) -> DbResult<()> {
        self.lock_sync()
    }

    async fn unlock(&self) -> DbResult<()> {
        self.unlock_sync()
    }

    async fn force_unlock(&self) -> DbResult<Option<String>> {
        self.force_unlock_sync()
    }

    async fn migrate(&self, sql: &str) -> DbResult<()> {
        self.migrate_sync(sql)
    }

    async fn insert_or_update_migration(&self, record: &MigrationRecord) -> DbResult<()> {
        self.upsert_sync(record)
    }

    async fn select_migrations(&self) -> DbResult<Vec<MigrationRecord>> {
        let records = self.select_all_sync()?;
        if records.is_empty() {
            return Err(DbError::NotFound("migration history is empty".to_string()));
        }
        Ok(records)
    }

    async fn select_last_migration_by_status(
        &self,
        status: MigrationStatus,
    ) -> DbResult<MigrationRecord> {
        self.select_last_by_status_sync(status)
    }

    fn target(&self) -> Option<String> {
        Some(self.path.clone())
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;


