//! Connection and schema manager
//!
//! Opens the backend, owns the shared connection pool, and creates or drops
//! every managed table. Schema changes are serialized by a fail-fast guard:
//! a second `initialize` or `reset` while one is running returns
//! [`StoreError::AlreadyInProgress`] instead of waiting.

use crate::config::DatabaseConfig;
use crate::db::engine::Storable;
use crate::db::schema::TableSchema;
use crate::db::{Database, Dialect};
use crate::error::{Result, StoreError};
use crate::models::{
    Agent, CrewAiFlowState, CrewAiMemory, Event, Feedback, LangGraphCheckpoint,
    LangGraphCheckpointWrite, PushNotification, Session, Task, Tool, ToolServer,
};
use crate::repositories::Repository;
use sqlx::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Every table the store manages, in creation order
pub fn managed_schemas() -> [&'static TableSchema; 12] {
    [
        Agent::schema(),
        Session::schema(),
        Task::schema(),
        Event::schema(),
        ToolServer::schema(),
        Tool::schema(),
        PushNotification::schema(),
        Feedback::schema(),
        LangGraphCheckpoint::schema(),
        LangGraphCheckpointWrite::schema(),
        CrewAiMemory::schema(),
        CrewAiFlowState::schema(),
    ]
}

/// Owns the database connection and its schema lifecycle
#[derive(Debug)]
pub struct DatabaseManager {
    db: Arc<Database>,
    schema_busy: AtomicBool,
}

/// Releases the schema guard when dropped
struct SchemaGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for SchemaGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl DatabaseManager {
    /// Connect to the backend described by `config`
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let db = Database::connect(config).await?;
        Ok(Self::from_database(Arc::new(db)))
    }

    /// Wrap an existing connection
    pub fn from_database(db: Arc<Database>) -> Self {
        Self {
            db,
            schema_busy: AtomicBool::new(false),
        }
    }

    /// Get the shared database handle
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn dialect(&self) -> Dialect {
        self.db.dialect()
    }

    /// Build the domain repository over the shared pool
    pub fn repository(&self) -> Repository {
        Repository::new(Arc::clone(&self.db))
    }

    /// Create every managed table and index that does not exist yet
    pub async fn initialize(&self) -> Result<()> {
        let _guard = self.acquire_schema_guard("initialize")?;
        self.create_schemas().await?;
        info!(tables = managed_schemas().len(), "Database schema initialized");
        Ok(())
    }

    /// Drop every managed table, optionally creating them again
    pub async fn reset(&self, recreate: bool) -> Result<()> {
        let _guard = self.acquire_schema_guard("reset")?;

        let mut tx = self.db.begin().await?;
        for schema in managed_schemas().iter().rev() {
            debug!(table = schema.name, "Dropping table");
            sqlx::query::<Any>(&schema.drop_table_sql())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        info!("Database schema dropped");

        if recreate {
            self.create_schemas().await?;
            info!("Database schema recreated");
        }
        Ok(())
    }

    /// Run a trivial query against the backend
    pub async fn health_check(&self) -> Result<()> {
        self.db.health_check().await
    }

    /// Close the pool; subsequent operations fail with a storage error
    pub async fn close(&self) {
        self.db.close().await;
    }

    async fn create_schemas(&self) -> Result<()> {
        let dialect = self.db.dialect();
        let mut tx = self.db.begin().await?;
        for schema in managed_schemas() {
            debug!(table = schema.name, "Creating table");
            sqlx::query::<Any>(&schema.create_table_sql(dialect))
                .execute(&mut *tx)
                .await?;
            for index_sql in schema.create_index_sql() {
                sqlx::query::<Any>(&index_sql).execute(&mut *tx).await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    fn acquire_schema_guard(&self, operation: &'static str) -> Result<SchemaGuard<'_>> {
        self.schema_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| StoreError::AlreadyInProgress(operation))?;
        Ok(SchemaGuard {
            busy: &self.schema_busy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_names(manager: &DatabaseManager) -> Vec<String> {
        let mut conn = manager.database().acquire().await.unwrap();
        sqlx::query_scalar::<Any, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&mut *conn)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_creates_every_table() {
        let manager = DatabaseManager::open(&DatabaseConfig::in_memory()).await.unwrap();
        manager.initialize().await.unwrap();

        let tables = table_names(&manager).await;
        for schema in managed_schemas() {
            assert!(tables.contains(&schema.name.to_string()), "missing {}", schema.name);
        }

        // Idempotent
        manager.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_drops_and_recreates() {
        let manager = DatabaseManager::open(&DatabaseConfig::in_memory()).await.unwrap();
        manager.initialize().await.unwrap();

        manager.reset(false).await.unwrap();
        assert!(table_names(&manager).await.is_empty());

        manager.reset(true).await.unwrap();
        assert_eq!(table_names(&manager).await.len(), managed_schemas().len());
    }

    #[tokio::test]
    async fn test_reentrant_schema_change_fails_fast() {
        let manager = DatabaseManager::open(&DatabaseConfig::in_memory()).await.unwrap();

        let guard = manager.acquire_schema_guard("initialize").unwrap();
        let err = manager.initialize().await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyInProgress("initialize")));
        let err = manager.reset(true).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyInProgress("reset")));

        drop(guard);
        manager.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn test_operations_fail_after_close() {
        let manager = DatabaseManager::open(&DatabaseConfig::in_memory()).await.unwrap();
        manager.initialize().await.unwrap();
        manager.health_check().await.unwrap();

        manager.close().await;
        assert!(manager.health_check().await.unwrap_err().is_storage());
    }
}
