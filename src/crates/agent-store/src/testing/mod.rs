//! Test helpers shared by unit tests

use crate::config::DatabaseConfig;
use crate::db::manager::DatabaseManager;
use crate::repositories::Repository;

/// Fresh in-memory store with every table created
pub(crate) async fn setup_repository() -> (DatabaseManager, Repository) {
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
