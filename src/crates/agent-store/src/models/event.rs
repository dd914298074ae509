//! Event (message / log entry) model

use crate::db::engine::{nullable_text, SqlValue, Storable};
use crate::db::schema::{Column, Index, TableSchema};
use crate::error::Result;
use crate::models::{decode, encode, new_id, now, parse_timestamp, timestamp};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

/// Message or log entry in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub session_id: String,
    pub task_id: Option<String>,
    pub user_id: String,

    /// Event payload (JSON)
    pub data: String,

    pub created_at: String,
}

pub(crate) static EVENT_SCHEMA: TableSchema = TableSchema {
    name: "events",
    columns: &[
        Column::text("id"),
        Column::text("session_id"),
        Column::nullable_text("task_id"),
        Column::text("user_id"),
        Column::text("data"),
        Column::text("created_at"),
    ],
    primary_key: &["id"],
    indexes: &[Index {
        name: "session_time",
        columns: &["session_id", "user_id", "created_at"],
    }],
};

impl Event {
    pub fn new<T: Serialize>(
        id: impl Into<String>,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        payload: &T,
    ) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            session_id: session_id.into(),
            task_id: None,
            user_id: user_id.into(),
            data: encode(payload)?,
            created_at: now(),
        })
    }

    /// Create an event with a generated ID
    pub fn generate<T: Serialize>(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        payload: &T,
    ) -> Result<Self> {
        Self::new(new_id(), session_id, user_id, payload)
    }

    /// Builder: Attach to a task
    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Builder: Override the creation time
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = timestamp(at);
        self
    }

    /// Creation time as a timestamp
    pub fn created_time(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    /// Decode the event payload
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.data)
    }
}

impl<'r> FromRow<'r, AnyRow> for Event {
    fn from_row(row: &'r AnyRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            task_id: nullable_text(row, "task_id")?,
            user_id: row.try_get("user_id")?,
            data: row.try_get("data")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl Storable for Event {
    fn schema() -> &'static TableSchema {
        &EVENT_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.id).into(),
            (&self.session_id).into(),
            self.task_id.clone().into(),
            (&self.user_id).into(),
            (&self.data).into(),
            (&self.created_at).into(),
        ]
    }
}

/// Paging options for session event listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventListOptions {
    /// Maximum events to return; 0 means unlimited
    pub limit: usize,

    /// Only events created strictly after this instant
    pub after: Option<DateTime<Utc>>,

    /// Oldest first instead of newest first
    pub order_ascending: bool,
}

impl EventListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn after(mut self, at: DateTime<Utc>) -> Self {
        self.after = Some(at);
        self
    }

    pub fn ascending(mut self) -> Self {
        self.order_ascending = true;
        self
    }
}
