//! Common test utilities and setup

#![allow(dead_code)]

use agent_store::{DatabaseConfig, DatabaseManager, Repository};
use sqlx::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

static TEST_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// File-backed store with every table created
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub async fn setup_test_store() -> (TempDir, DatabaseManager, Repository) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    // Unique name per test database
    let counter = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let db_path = temp_dir.path().join(format!("test_{}.db", counter));

    let config = DatabaseConfig::sqlite(db_path).with_max_connections(8);
    let manager = DatabaseManager::open(&config)
        .await
        .expect("Failed to open test database");
    manager
        .initialize()
        .await
        .expect("Failed to initialize schema");

    let repo = manager.repository();
    (temp_dir, manager, repo)
}

/// In-memory store with every table created
pub async fn setup_memory_store() -> (DatabaseManager, Repository) {
    let manager = DatabaseManager::open(&DatabaseConfig::in_memory())
        .await
        .expect("Failed to open in-memory database");
    manager
        .initialize()
        .await
        .expect("Failed to initialize schema");
    let repo = manager.repository();
    (manager, repo)
}

/// Run raw SQL against the store, for fault injection
pub async fn execute_sql(manager: &DatabaseManager, sql: &str) {
    sqlx::query::<Any>(sql)
        .execute(manager.database().pool())
        .await
        .expect("Failed to execute test SQL");
}
