//! Session model

use crate::db::engine::{nullable_text, SqlValue, Storable};
use crate::db::schema::{Column, Index, TableSchema};
use crate::models::now;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

/// Conversation session owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier, unique per user
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Display name
    pub name: Option<String>,

    /// Agent serving this session
    pub agent_id: Option<String>,

    /// Creation timestamp
    pub created_at: String,

    /// Last update timestamp
    pub updated_at: String,
}

pub(crate) static SESSION_SCHEMA: TableSchema = TableSchema {
    name: "sessions",
    columns: &[
        Column::text("id"),
        Column::text("user_id"),
        Column::nullable_text("name"),
        Column::nullable_text("agent_id"),
        Column::text("created_at"),
        Column::text("updated_at"),
    ],
    primary_key: &["id", "user_id"],
    indexes: &[
        Index {
            name: "user",
            columns: &["user_id"],
        },
        Index {
            name: "agent",
            columns: &["agent_id", "user_id"],
        },
    ],
};

impl Session {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            name: None,
            agent_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Builder: Set display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: Attach to an agent
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}

impl<'r> FromRow<'r, AnyRow> for Session {
    fn from_row(row: &'r AnyRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: nullable_text(row, "name")?,
            agent_id: nullable_text(row, "agent_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Storable for Session {
    fn schema() -> &'static TableSchema {
        &SESSION_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.id).into(),
            (&self.user_id).into(),
            self.name.clone().into(),
            self.agent_id.clone().into(),
            (&self.created_at).into(),
            (&self.updated_at).into(),
        ]
    }
}
