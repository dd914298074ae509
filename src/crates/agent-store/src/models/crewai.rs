//! CrewAI memory and flow state models

use crate::db::engine::{SqlValue, Storable};
use crate::db::schema::{Column, Index, TableSchema};
use crate::error::Result;
use crate::models::{decode, encode, now};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Long-term memory entry for a CrewAI agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CrewAiMemory {
    /// Generated on insert; 0 until stored
    pub id: i64,
    pub user_id: String,
    pub thread_id: String,

    /// Memory document (JSON with `task_description` and optional `score`)
    pub memory_data: String,

    pub created_at: String,
}

pub(crate) static CREWAI_MEMORY_SCHEMA: TableSchema = TableSchema {
    name: "crewai_agent_memory",
    columns: &[
        Column::serial("id"),
        Column::text("user_id"),
        Column::text("thread_id"),
        Column::text("memory_data"),
        Column::text("created_at"),
    ],
    primary_key: &["id"],
    indexes: &[Index {
        name: "thread",
        columns: &["user_id", "thread_id"],
    }],
};

impl CrewAiMemory {
    pub fn new<T: Serialize>(
        user_id: impl Into<String>,
        thread_id: impl Into<String>,
        memory: &T,
    ) -> Result<Self> {
        Ok(Self {
            id: 0,
            user_id: user_id.into(),
            thread_id: thread_id.into(),
            memory_data: encode(memory)?,
            created_at: now(),
        })
    }

    /// Decode the memory document
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.memory_data)
    }

    /// `task_description` field of the memory document
    pub fn task_description(&self) -> Result<Option<String>> {
        let doc: serde_json::Value = self.payload()?;
        Ok(doc
            .get("task_description")
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    /// `score` field of the memory document
    pub fn score(&self) -> Result<Option<f64>> {
        let doc: serde_json::Value = self.payload()?;
        Ok(doc.get("score").and_then(|v| v.as_f64()))
    }
}

impl Storable for CrewAiMemory {
    fn schema() -> &'static TableSchema {
        &CREWAI_MEMORY_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.user_id).into(),
            (&self.thread_id).into(),
            (&self.memory_data).into(),
            (&self.created_at).into(),
        ]
    }
}

/// Snapshot of a CrewAI flow's state
///
/// Flow state is append-only; the newest row per thread is the current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CrewAiFlowState {
    /// Generated on insert; 0 until stored
    pub id: i64,
    pub user_id: String,
    pub thread_id: String,

    /// Flow method that produced this state
    pub method_name: String,

    /// Flow state document (JSON)
    pub state_data: String,

    pub created_at: String,
}

pub(crate) static CREWAI_FLOW_STATE_SCHEMA: TableSchema = TableSchema {
    name: "crewai_flow_state",
    columns: &[
        Column::serial("id"),
        Column::text("user_id"),
        Column::text("thread_id"),
        Column::text("method_name"),
        Column::text("state_data"),
        Column::text("created_at"),
    ],
    primary_key: &["id"],
    indexes: &[Index {
        name: "thread",
        columns: &["user_id", "thread_id"],
    }],
};

impl CrewAiFlowState {
    pub fn new<T: Serialize>(
        user_id: impl Into<String>,
        thread_id: impl Into<String>,
        method_name: impl Into<String>,
        state: &T,
    ) -> Result<Self> {
        Ok(Self {
            id: 0,
            user_id: user_id.into(),
            thread_id: thread_id.into(),
            method_name: method_name.into(),
            state_data: encode(state)?,
            created_at: now(),
        })
    }

    /// Decode the flow state document
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.state_data)
    }
}

impl Storable for CrewAiFlowState {
    fn schema() -> &'static TableSchema {
        &CREWAI_FLOW_STATE_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.user_id).into(),
            (&self.thread_id).into(),
            (&self.method_name).into(),
            (&self.state_data).into(),
            (&self.created_at).into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_fields() {
        let memory = CrewAiMemory::new(
            "u",
            "t",
            &json!({"task_description": "Research rust", "score": 0.25}),
        )
        .unwrap();
        assert_eq!(memory.task_description().unwrap().as_deref(), Some("Research rust"));
        assert_eq!(memory.score().unwrap(), Some(0.25));
    }

    #[test]
    fn test_memory_without_score() {
        let memory = CrewAiMemory::new("u", "t", &json!({"task_description": "x"})).unwrap();
        assert_eq!(memory.score().unwrap(), None);
    }
}
