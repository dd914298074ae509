//! Tool server and tool models

use crate::db::engine::{nullable_text, SqlValue, Storable};
use crate::db::schema::{Column, Index, TableSchema};
use crate::models::now;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

/// Group kind of a server registered by URL
pub const GROUP_KIND_REMOTE_MCP_SERVER: &str = "RemoteMCPServer";
/// Group kind of a server launched as a local command
pub const GROUP_KIND_MCP_SERVER: &str = "MCPServer";

/// Registered external tool provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolServer {
    pub name: String,
    pub group_kind: String,
    pub description: String,

    /// Last successful tool discovery
    pub last_connected: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

pub(crate) static TOOL_SERVER_SCHEMA: TableSchema = TableSchema {
    name: "tool_servers",
    columns: &[
        Column::text("name"),
        Column::text("group_kind"),
        Column::text("description"),
        Column::nullable_text("last_connected"),
        Column::text("created_at"),
        Column::text("updated_at"),
    ],
    primary_key: &["name", "group_kind"],
    indexes: &[],
};

impl ToolServer {
    pub fn new(name: impl Into<String>, group_kind: impl Into<String>) -> Self {
        let now = now();
        Self {
            name: name.into(),
            group_kind: group_kind.into(),
            description: String::new(),
            last_connected: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Builder: Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Record a successful connection now
    pub fn mark_connected(&mut self) {
        let now = now();
        self.last_connected = Some(now.clone());
        self.updated_at = now;
    }
}

impl<'r> FromRow<'r, AnyRow> for ToolServer {
    fn from_row(row: &'r AnyRow) -> sqlx::Result<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            group_kind: row.try_get("group_kind")?,
            description: row.try_get("description")?,
            last_connected: nullable_text(row, "last_connected")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Storable for ToolServer {
    fn schema() -> &'static TableSchema {
        &TOOL_SERVER_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.name).into(),
            (&self.group_kind).into(),
            (&self.description).into(),
            self.last_connected.clone().into(),
            (&self.created_at).into(),
            (&self.updated_at).into(),
        ]
    }
}

/// Tool exposed by a tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tool {
    /// Tool name, unique within its server and group kind
    pub id: String,
    pub server_name: String,
    pub group_kind: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

pub(crate) static TOOL_SCHEMA: TableSchema = TableSchema {
    name: "tools",
    columns: &[
        Column::text("id"),
        Column::text("server_name"),
        Column::text("group_kind"),
        Column::text("description"),
        Column::text("created_at"),
        Column::text("updated_at"),
    ],
    primary_key: &["id", "server_name", "group_kind"],
    indexes: &[Index {
        name: "server",
        columns: &["server_name", "group_kind"],
    }],
};

impl Storable for Tool {
    fn schema() -> &'static TableSchema {
        &TOOL_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.id).into(),
            (&self.server_name).into(),
            (&self.group_kind).into(),
            (&self.description).into(),
            (&self.created_at).into(),
            (&self.updated_at).into(),
        ]
    }
}

/// A tool as reported by its server during discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Outcome of replacing a server's tool set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRefreshSummary {
    /// Tools that did not exist before
    pub added: usize,
    /// Tools dropped because the server no longer reports them
    pub removed: usize,
    /// Tools present before and after
    pub retained: usize,
}

impl ToolRefreshSummary {
    /// Whether the refresh changed the tool set
    pub fn changed(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}
