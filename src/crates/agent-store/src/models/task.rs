//! Task model

use crate::db::engine::{nullable_text, SqlValue, Storable};
use crate::db::schema::{Column, Index, TableSchema};
use crate::error::Result;
use crate::models::{decode, encode, now};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

/// Executed task, stored as an opaque protocol payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier
    pub id: String,

    /// Session the task ran in
    pub session_id: Option<String>,

    /// Task payload (JSON)
    pub data: String,

    /// Creation timestamp
    pub created_at: String,

    /// Last update timestamp
    pub updated_at: String,
}

pub(crate) static TASK_SCHEMA: TableSchema = TableSchema {
    name: "tasks",
    columns: &[
        Column::text("id"),
        Column::nullable_text("session_id"),
        Column::text("data"),
        Column::text("created_at"),
        Column::text("updated_at"),
    ],
    primary_key: &["id"],
    indexes: &[Index {
        name: "session",
        columns: &["session_id"],
    }],
};

impl Task {
    /// Create a task from a serializable payload
    pub fn new<T: Serialize>(id: impl Into<String>, payload: &T) -> Result<Self> {
        let now = now();
        Ok(Self {
            id: id.into(),
            session_id: None,
            data: encode(payload)?,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Builder: Attach to a session
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Decode the task payload
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.data)
    }
}

impl<'r> FromRow<'r, AnyRow> for Task {
    fn from_row(row: &'r AnyRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: nullable_text(row, "session_id")?,
            data: row.try_get("data")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Storable for Task {
    fn schema() -> &'static TableSchema {
        &TASK_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.id).into(),
            self.session_id.clone().into(),
            (&self.data).into(),
            (&self.created_at).into(),
            (&self.updated_at).into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_payload() {
        let task = Task::new("t1", &json!({"kind": "task", "status": {"state": "working"}}))
            .unwrap()
            .with_session("s1");
        let payload: serde_json::Value = task.payload().unwrap();
        assert_eq!(payload["status"]["state"], "working");
        assert_eq!(task.session_id.as_deref(), Some("s1"));
    }
}
