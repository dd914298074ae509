//! Agent model

use crate::db::engine::{SqlValue, Storable};
use crate::db::schema::{Column, TableSchema};
use crate::error::Result;
use crate::models::{decode, encode, now};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How an agent is defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    /// Built from a declarative definition
    Declarative,
    /// Bring-your-own container image
    Byo,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declarative => "declarative",
            Self::Byo => "byo",
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentType {
    type Err = crate::error::StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "declarative" => Ok(Self::Declarative),
            "byo" => Ok(Self::Byo),
            other => Err(crate::error::StoreError::invalid_state(format!(
                "Unknown agent type: {}",
                other
            ))),
        }
    }
}

/// Registered agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Agent {
    /// Agent identifier
    pub id: String,

    /// Agent type (`declarative` or `byo`)
    pub agent_type: String,

    /// Agent definition (JSON)
    pub config: String,

    /// Creation timestamp
    pub created_at: String,

    /// Last update timestamp
    pub updated_at: String,
}

pub(crate) static AGENT_SCHEMA: TableSchema = TableSchema {
    name: "agents",
    columns: &[
        Column::text("id"),
        Column::text("agent_type"),
        Column::text("config"),
        Column::text("created_at"),
        Column::text("updated_at"),
    ],
    primary_key: &["id"],
    indexes: &[],
};

impl Agent {
    /// Create a new agent with an empty definition
    pub fn new(id: impl Into<String>, agent_type: AgentType) -> Self {
        let now = now();
        Self {
            id: id.into(),
            agent_type: agent_type.as_str().to_string(),
            config: "{}".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Builder: Set the agent definition
    pub fn with_config<T: Serialize>(mut self, config: &T) -> Result<Self> {
        self.config = encode(config)?;
        Ok(self)
    }

    /// Parsed agent type
    pub fn kind(&self) -> Result<AgentType> {
        self.agent_type.parse()
    }

    /// Decode the agent definition
    pub fn config<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.config)
    }
}

impl Storable for Agent {
    fn schema() -> &'static TableSchema {
        &AGENT_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.id).into(),
            (&self.agent_type).into(),
            (&self.config).into(),
            (&self.created_at).into(),
            (&self.updated_at).into(),
        ]
    }
}
