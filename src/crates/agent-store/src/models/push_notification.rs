//! Push notification subscription model

use crate::db::engine::{SqlValue, Storable};
use crate::db::schema::{Column, TableSchema};
use crate::error::Result;
use crate::models::{decode, encode, now};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Push notification config attached to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PushNotification {
    /// Config identifier, unique per task
    pub id: String,
    pub task_id: String,

    /// Notification config (JSON)
    pub data: String,

    pub created_at: String,
    pub updated_at: String,
}

pub(crate) static PUSH_NOTIFICATION_SCHEMA: TableSchema = TableSchema {
    name: "push_notifications",
    columns: &[
        Column::text("id"),
        Column::text("task_id"),
        Column::text("data"),
        Column::text("created_at"),
        Column::text("updated_at"),
    ],
    primary_key: &["task_id", "id"],
    indexes: &[],
};

impl PushNotification {
    pub fn new<T: Serialize>(
        task_id: impl Into<String>,
        id: impl Into<String>,
        config: &T,
    ) -> Result<Self> {
        let now = now();
        Ok(Self {
            id: id.into(),
            task_id: task_id.into(),
            data: encode(config)?,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Decode the notification config
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.data)
    }
}

impl Storable for PushNotification {
    fn schema() -> &'static TableSchema {
        &PUSH_NOTIFICATION_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.id).into(),
            (&self.task_id).into(),
            (&self.data).into(),
            (&self.created_at).into(),
            (&self.updated_at).into(),
        ]
    }
}
