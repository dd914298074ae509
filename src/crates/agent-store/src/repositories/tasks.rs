//! Task operations

use super::Repository;
use crate::db::engine::{self, Query};
use crate::error::Result;
use crate::models::{now, Task};
use tracing::debug;

impl Repository {
    /// Create or replace a task
    pub async fn store_task(&self, task: &Task) -> Result<()> {
        let mut task = task.clone();
        task.updated_at = now();

        let mut conn = self.conn().await?;
        engine::save(&mut *conn, &task).await?;
        debug!(task_id = %task.id, "Stored task");
        Ok(())
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        let mut conn = self.conn().await?;
        engine::get(&mut *conn, &Query::new().eq("id", id)).await
    }

    /// Whether a task exists, without loading its payload
    pub async fn task_exists(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        Ok(engine::count::<Task>(&mut *conn, &Query::new().eq("id", id)).await? > 0)
    }

    /// List the tasks run in a session, oldest first
    pub async fn list_tasks_for_session(&self, session_id: &str) -> Result<Vec<Task>> {
        let mut conn = self.conn().await?;
        engine::list(&mut *conn, &Query::new().eq("session_id", session_id)).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        engine::delete::<Task>(&mut *conn, &Query::new().eq("id", id)).await?;
        debug!(task_id = %id, "Deleted task");
        Ok(())
    }
}
