//! Push notification config operations

use super::Repository;
use crate::db::engine::{self, Query};
use crate::error::Result;
use crate::models::{now, PushNotification};
use tracing::debug;

impl Repository {
    /// Create or replace a push notification config
    pub async fn store_push_notification(&self, config: &PushNotification) -> Result<()> {
        let mut config = config.clone();
        config.updated_at = now();

        let mut conn = self.conn().await?;
        engine::save(&mut *conn, &config).await?;
        debug!(task_id = %config.task_id, config_id = %config.id, "Stored push notification config");
        Ok(())
    }

    pub async fn get_push_notification(&self, task_id: &str, id: &str) -> Result<PushNotification> {
        let mut conn = self.conn().await?;
        engine::get(&mut *conn, &Query::new().eq("task_id", task_id).eq("id", id)).await
    }

    /// List every config registered for a task
    pub async fn list_push_notifications(&self, task_id: &str) -> Result<Vec<PushNotification>> {
        let mut conn = self.conn().await?;
        engine::list(&mut *conn, &Query::new().eq("task_id", task_id)).await
    }

    pub async fn delete_push_notification(&self, task_id: &str, id: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        engine::delete::<PushNotification>(
            &mut *conn,
            &Query::new().eq("task_id", task_id).eq("id", id),
        )
        .await?;
        Ok(())
    }
}
