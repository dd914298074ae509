//! Database connection management
//!
//! Provides the pooled connection shared by every repository operation. One
//! `AnyPool` serves both the embedded SQLite backend and the networked
//! PostgreSQL backend; all SQL issued by the engine uses `$N` placeholders,
//! which both drivers accept.

pub mod engine;
pub mod manager;
pub mod schema;

use crate::config::{DatabaseConfig, DatabaseType};
use crate::error::{Result, StoreError};
use sqlx::any::AnyPoolOptions;
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool, Transaction};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Type alias for the database connection pool
pub type DatabasePool = AnyPool;

/// SQL dialect of the connected backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Expression reading the text field `field` of a JSON document column
    pub fn json_text(&self, column: &str, field: &str) -> String {
        match self {
            Dialect::Sqlite => format!("json_extract({}, '$.{}')", column, field),
            Dialect::Postgres => format!("(CAST({} AS JSON) ->> '{}')", column, field),
        }
    }

    /// Expression reading the numeric field `field` of a JSON document column
    pub fn json_number(&self, column: &str, field: &str) -> String {
        match self {
            Dialect::Sqlite => self.json_text(column, field),
            Dialect::Postgres => {
                format!("CAST({} AS DOUBLE PRECISION)", self.json_text(column, field))
            }
        }
    }
}

impl From<DatabaseType> for Dialect {
    fn from(db_type: DatabaseType) -> Self {
        match db_type {
            DatabaseType::Sqlite => Dialect::Sqlite,
            DatabaseType::Postgres => Dialect::Postgres,
        }
    }
}

/// Database connection wrapper
#[derive(Clone, Debug)]
pub struct Database {
    pool: Arc<DatabasePool>,
    dialect: Dialect,
}

impl Database {
    /// Connect to the backend described by `config`
    ///
    /// SQLite file databases get WAL journaling and a busy timeout so that
    /// concurrent writers wait for each other instead of failing. In-memory
    /// databases are pinned to a single connection that is never recycled,
    /// since closing it would discard the data.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.connection_url()?;
        let dialect = Dialect::from(config.db_type);
        let in_memory = config.is_in_memory();

        sqlx::any::install_default_drivers();

        if dialect == Dialect::Sqlite && !in_memory {
            if let Some(parent) = config.sqlite_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StoreError::config(format!("Failed to create database directory: {}", e))
                    })?;
                }
            }
        }

        let mut options = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));

        if in_memory {
            options = options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        if dialect == Dialect::Sqlite {
            options = options.after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA busy_timeout = 5000")
                        .execute(&mut *conn)
                        .await?;
                    if !in_memory {
                        sqlx::query("PRAGMA journal_mode = WAL")
                            .execute(&mut *conn)
                            .await?;
                    }
                    Ok(())
                })
            });
        }

        debug!(database_type = %config.db_type, in_memory, "Connecting to database");

        let pool = options.connect(&url).await.map_err(|e| match e {
            sqlx::Error::Configuration(msg) => {
                StoreError::config(format!("Invalid connection settings: {}", msg))
            }
            other => StoreError::from(other),
        })?;

        info!(database_type = %config.db_type, "Database connection established");

        Ok(Self {
            pool: Arc::new(pool),
            dialect,
        })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Get the SQL dialect of the backend
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Check out a pooled connection
    pub async fn acquire(&self) -> Result<PoolConnection<Any>> {
        Ok(self.pool.acquire().await?)
    }

    /// Begin a transaction; it rolls back when dropped without `commit`
    pub async fn begin(&self) -> Result<Transaction<'static, Any>> {
        Ok(self.pool.begin().await?)
    }

    /// Perform a health check by running a simple query
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    /// Whether the pool has been closed
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close the database connection
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}
