//! Domain repository
//!
//! [`Repository`] is the single façade callers use. Each entity's operations
//! live in their own `impl Repository` block below; all of them are thin
//! compositions over [`crate::db::engine`]. Operations that touch more than
//! one row atomically (event batches, checkpoint writes, tool reconciliation,
//! cascading deletes) run inside one transaction that rolls back on any error.

mod agents;
mod checkpoints;
mod crewai;
mod events;
mod feedback;
mod push_notifications;
mod sessions;
mod tasks;
mod tools;

use crate::db::Database;
use crate::error::Result;
use sqlx::pool::PoolConnection;
use sqlx::Any;
use std::sync::Arc;

/// Repository for every stored entity
#[derive(Clone, Debug)]
pub struct Repository {
    db: Arc<Database>,
}

impl Repository {
    /// Create a new repository
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get the underlying database handle
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    async fn conn(&self) -> Result<PoolConnection<Any>> {
        self.db.acquire().await
    }
}
