use super::*;
use sf_core::MigrationName;
use tempfile::tempdir;

fn record(version: u32, name: &str, status: MigrationStatus) -> MigrationRecord {
    MigrationRecord::new(version, MigrationName::new(name), status)
}

async fn connected() -> DuckDbStore {
    let store = DuckDbStore::new(":memory:", StoreOptions::default());
    store.connect().await.unwrap();
    store
}

#[tokio::test]
async fn test_operations_require_connect() {
    let store = DuckDbStore::new(":memory:", StoreOptions::default());
    assert!(matches!(
        store.migrate("SELECT 1").await.unwrap_err(),
        DbError::NotConnected
    ));
    // close before connect is harmless
    store.close().await.unwrap();
    assert_eq!(store.db_type(), "duckdb");
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let store = connected().await;
    store.connect().await.unwrap();
    store.close().await.unwrap();
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_migrate_executes_statements() {
    let store = connected().await;
    store
        .migrate("CREATE TABLE users (id INT); INSERT INTO users VALUES (1);")
        .await
        .unwrap();

    let err = store.migrate("SELEC nonsense").await.unwrap_err();
    assert!(matches!(err, DbError::ExecutionError(_)));
}

#[tokio::test]
async fn test_history_round_trip_in_insertion_order() {
    let store = connected().await;
    let first = record(1, "create_users", MigrationStatus::Success);
    store.insert_or_update_migration(&first).await.unwrap();
    store
        .insert_or_update_migration(&record(2, "add_index", MigrationStatus::Success))
        .await
        .unwrap();

    let records = store.select_migrations().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].version, 1);
    assert_eq!(records[0].name, "create_users");
    assert_eq!(
        records[0].status_changed_at.timestamp_micros(),
        first.status_changed_at.timestamp_micros()
    );
    assert_eq!(records[1].version, 2);
}

#[tokio::test]
async fn test_update_in_place_keeps_position() {
    let store = connected().await;
    for (version, name) in [(1, "a"), (2, "b")] {
        store
            .insert_or_update_migration(&record(version, name, MigrationStatus::Success))
            .await
            .unwrap();
    }
    store
        .insert_or_update_migration(&record(2, "b", MigrationStatus::Cancel))
        .await
        .unwrap();
    store
        .insert_or_update_migration(&record(1, "a", MigrationStatus::Error))
        .await
        .unwrap();

    let records = store.select_migrations().await.unwrap();
    let summary: Vec<_> = records.iter().map(|r| (r.version, r.status)).collect();
    assert_eq!(
        summary,
        vec![(1, MigrationStatus::Error), (2, MigrationStatus::Cancel)]
    );
}

#[tokio::test]
async fn test_last_by_status_uses_insertion_order() {
    let store = connected().await;
    store
        .insert_or_update_migration(&record(2, "b", MigrationStatus::Success))
        .await
        .unwrap();
    store
        .insert_or_update_migration(&record(1, "a", MigrationStatus::Success))
        .await
        .unwrap();

    let last = store
        .select_last_migration_by_status(MigrationStatus::Success)
        .await
        .unwrap();
    assert_eq!(last.version, 1);

    let err = store
        .select_last_migration_by_status(MigrationStatus::Cancel)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_empty_history_is_not_found() {
    let store = connected().await;
    assert!(store.select_migrations().await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_name_conflict_is_rejected() {
    let store = connected().await;
    store
        .insert_or_update_migration(&record(1, "create_users", MigrationStatus::Success))
        .await
        .unwrap();

    let err = store
        .insert_or_update_migration(&record(1, "drop_users", MigrationStatus::Process))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NameConflict { version: 1, .. }));

    let records = store.select_migrations().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "create_users");
    assert_eq!(records[0].status, MigrationStatus::Success);
}

#[tokio::test]
async fn test_lock_contention_between_handles() {
    let first = connected().await;
    let second = first.try_clone().unwrap();

    first.lock().await.unwrap();
    let err = second.lock().await.unwrap_err();
    assert!(matches!(err, DbError::LockContention { ref holder } if holder == first.holder()));

    // releasing from the non-holder leaves the lock in place
    second.unlock().await.unwrap();
    assert!(second.lock().await.is_err());

    first.unlock().await.unwrap();
    second.lock().await.unwrap();
    second.unlock().await.unwrap();
}

#[tokio::test]
async fn test_stale_lock_is_taken_over() {
    let options = StoreOptions {
        lock_timeout: Some(Duration::from_secs(0)),
        ..StoreOptions::default()
    };
    let first = DuckDbStore::new(":memory:", options);
    first.connect().await.unwrap();
    let second = first.try_clone().unwrap();

    first.lock().await.unwrap();
    std::thread::sleep(Duration::from_millis(5));
    second.lock().await.unwrap();
}

#[tokio::test]
async fn test_custom_table_names_and_file_persistence() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.duckdb");
    let options = StoreOptions {
        history_table: "schema_history".to_string(),
        lock_table: "schema_lock".to_string(),
        lock_timeout: None,
        read_only: false,
    };

    {
        let store = DuckDbStore::new(path.to_string_lossy(), options.clone());
        store.connect().await.unwrap();
        store
            .insert_or_update_migration(&record(1, "init", MigrationStatus::Success))
            .await
            .unwrap();
        store.close().await.unwrap();
    }

    let store = DuckDbStore::new(path.to_string_lossy(), options);
    store.connect().await.unwrap();
    let records = store.select_migrations().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(store.target().as_deref(), Some(path.to_string_lossy().as_ref()));
}

#[tokio::test]
async fn test_lock_left_by_dead_run_can_be_cleared() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.duckdb").to_string_lossy().to_string();

    let crashed_holder = {
        let crashed = DuckDbStore::new(path.clone(), StoreOptions::default());
        crashed.connect().await.unwrap();
        crashed.lock().await.unwrap();
        crashed.holder().to_string()
        // dropped without unlock
    };

    let next = DuckDbStore::new(path, StoreOptions::default());
    next.connect().await.unwrap();
    assert!(matches!(
        next.lock().await.unwrap_err(),
        DbError::LockContention { ref holder } if *holder == crashed_holder
    ));

    assert_eq!(next.force_unlock().await.unwrap(), Some(crashed_holder));
    assert_eq!(next.force_unlock().await.unwrap(), None);
    next.lock().await.unwrap();
    next.unlock().await.unwrap();
}

#[tokio::test]
async fn test_lock_left_by_dead_run_expires() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.duckdb").to_string_lossy().to_string();
    let options = StoreOptions {
        lock_timeout: Some(Duration::from_millis(1)),
        ..StoreOptions::default()
    };

    {
        let crashed = DuckDbStore::new(path.clone(), options.clone());
        crashed.connect().await.unwrap();
        crashed.lock().await.unwrap();
    }
    std::thread::sleep(Duration::from_millis(5));

    let next = DuckDbStore::new(path, options);
    next.connect().await.unwrap();
    next.lock().await.unwrap();
}

#[test]
fn test_default_options_expire_locks() {
    assert_eq!(
        StoreOptions::default().lock_timeout,
        Some(Duration::from_secs(sf_core::config::DEFAULT_LOCK_TIMEOUT_SECS))
    );
}

#[tokio::test]
async fn test_read_only_store_does_not_create_tables() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("existing.duckdb");
    drop(Connection::open(&path).unwrap());

    let store = DuckDbStore::new(path.to_string_lossy(), StoreOptions::default().read_only());
    store.connect().await.unwrap();
    assert!(store.select_migrations().await.unwrap_err().is_not_found());
    assert!(store
        .select_last_migration_by_status(MigrationStatus::Success)
        .await
        .unwrap_err()
        .is_not_found());
    store.close().await.unwrap();

    let conn = Connection::open(&path).unwrap();
    let tables: i64 = conn
        .query_row("SELECT COUNT(*) FROM information_schema.tables", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(tables, 0);
}

#[tokio::test]
async fn test_read_only_store_reads_history() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.duckdb").to_string_lossy().to_string();
    {
        let writer = DuckDbStore::new(path.clone(), StoreOptions::default());
        writer.connect().await.unwrap();
        writer
            .insert_or_update_migration(&record(1, "init", MigrationStatus::Success))
            .await
            .unwrap();
        writer.close().await.unwrap();
    }

    let reader = DuckDbStore::new(path, StoreOptions::default().read_only());
    reader.connect().await.unwrap();
    let last = reader
        .select_last_migration_by_status(MigrationStatus::Success)
        .await
        .unwrap();
    assert_eq!(last.name, "init");
}
