//! LangGraph checkpoint models
//!
//! A checkpoint is a point-in-time snapshot of a resumable execution graph,
//! addressed by `(user_id, thread_id, checkpoint_ns, checkpoint_id)`. Writes are
//! the side-effect log recorded while advancing from that checkpoint, replayed
//! in `(task_id, write_idx)` order.

use crate::db::engine::{nullable_text, SqlValue, Storable};
use crate::db::schema::{Column, Index, TableSchema};
use crate::error::Result;
use crate::models::{decode, now};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

/// Snapshot of one execution step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangGraphCheckpoint {
    pub user_id: String,
    pub thread_id: String,
    pub checkpoint_ns: String,

    /// Monotonically sortable checkpoint identifier
    pub checkpoint_id: String,

    pub parent_checkpoint_id: Option<String>,

    /// Serializer tag for `checkpoint` and `metadata`
    pub checkpoint_type: String,

    /// Serialized graph state
    pub checkpoint: String,

    /// Serialized checkpoint metadata
    pub metadata: String,

    pub created_at: String,
    pub updated_at: String,
}

pub(crate) static CHECKPOINT_SCHEMA: TableSchema = TableSchema {
    name: "lg_checkpoints",
    columns: &[
        Column::text("user_id"),
        Column::text("thread_id"),
        Column::text("checkpoint_ns"),
        Column::text("checkpoint_id"),
        Column::nullable_text("parent_checkpoint_id"),
        Column::text("checkpoint_type"),
        Column::text("checkpoint"),
        Column::text("metadata"),
        Column::text("created_at"),
        Column::text("updated_at"),
    ],
    primary_key: &["user_id", "thread_id", "checkpoint_ns", "checkpoint_id"],
    indexes: &[Index {
        name: "thread",
        columns: &["user_id", "thread_id", "checkpoint_ns"],
    }],
};

impl LangGraphCheckpoint {
    pub fn new(
        user_id: impl Into<String>,
        thread_id: impl Into<String>,
        checkpoint_ns: impl Into<String>,
        checkpoint_id: impl Into<String>,
    ) -> Self {
        let now = now();
        Self {
            user_id: user_id.into(),
            thread_id: thread_id.into(),
            checkpoint_ns: checkpoint_ns.into(),
            checkpoint_id: checkpoint_id.into(),
            parent_checkpoint_id: None,
            checkpoint_type: "json".to_string(),
            checkpoint: "{}".to_string(),
            metadata: "{}".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Builder: Set the parent checkpoint
    pub fn with_parent(mut self, parent_checkpoint_id: impl Into<String>) -> Self {
        self.parent_checkpoint_id = Some(parent_checkpoint_id.into());
        self
    }

    /// Builder: Set the serialized state and its serializer tag
    pub fn with_state(
        mut self,
        checkpoint_type: impl Into<String>,
        checkpoint: impl Into<String>,
    ) -> Self {
        self.checkpoint_type = checkpoint_type.into();
        self.checkpoint = checkpoint.into();
        self
    }

    /// Builder: Set the serialized metadata
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Decode a JSON-serialized checkpoint state
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.checkpoint)
    }

    /// Decode JSON-serialized checkpoint metadata
    pub fn decode_metadata<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.metadata)
    }

    /// Whether two checkpoints carry the same stored content
    ///
    /// Timestamps are ignored: a retried store is compared by payload only.
    pub fn same_content(&self, other: &Self) -> bool {
        self.key() == other.key()
            && self.parent_checkpoint_id == other.parent_checkpoint_id
            && self.checkpoint_type == other.checkpoint_type
            && self.checkpoint == other.checkpoint
            && self.metadata == other.metadata
    }

    pub(crate) fn key(&self) -> (&str, &str, &str, &str) {
        (
            &self.user_id,
            &self.thread_id,
            &self.checkpoint_ns,
            &self.checkpoint_id,
        )
    }
}

impl<'r> FromRow<'r, AnyRow> for LangGraphCheckpoint {
    fn from_row(row: &'r AnyRow) -> sqlx::Result<Self> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            thread_id: row.try_get("thread_id")?,
            checkpoint_ns: row.try_get("checkpoint_ns")?,
            checkpoint_id: row.try_get("checkpoint_id")?,
            parent_checkpoint_id: nullable_text(row, "parent_checkpoint_id")?,
            checkpoint_type: row.try_get("checkpoint_type")?,
            checkpoint: row.try_get("checkpoint")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Storable for LangGraphCheckpoint {
    fn schema() -> &'static TableSchema {
        &CHECKPOINT_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.user_id).into(),
            (&self.thread_id).into(),
            (&self.checkpoint_ns).into(),
            (&self.checkpoint_id).into(),
            self.parent_checkpoint_id.clone().into(),
            (&self.checkpoint_type).into(),
            (&self.checkpoint).into(),
            (&self.metadata).into(),
            (&self.created_at).into(),
            (&self.updated_at).into(),
        ]
    }
}

/// One pending write recorded against a checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LangGraphCheckpointWrite {
    pub user_id: String,
    pub thread_id: String,
    pub checkpoint_ns: String,
    pub checkpoint_id: String,
    pub task_id: String,

    /// Replay position within the task
    pub write_idx: i64,

    /// Channel the value is written to
    pub channel: String,

    /// Serializer tag for `value`
    pub value_type: String,

    pub value: String,

    pub created_at: String,
}

pub(crate) static CHECKPOINT_WRITE_SCHEMA: TableSchema = TableSchema {
    name: "lg_checkpoint_writes",
    columns: &[
        Column::text("user_id"),
        Column::text("thread_id"),
        Column::text("checkpoint_ns"),
        Column::text("checkpoint_id"),
        Column::text("task_id"),
        Column::big_int("write_idx"),
        Column::text("channel"),
        Column::text("value_type"),
        Column::text("value"),
        Column::text("created_at"),
    ],
    primary_key: &[
        "user_id",
        "thread_id",
        "checkpoint_ns",
        "checkpoint_id",
        "task_id",
        "write_idx",
    ],
    indexes: &[Index {
        name: "checkpoint",
        columns: &["user_id", "thread_id", "checkpoint_ns", "checkpoint_id"],
    }],
};

impl LangGraphCheckpointWrite {
    /// Create a write against `checkpoint`
    pub fn new(
        checkpoint: &LangGraphCheckpoint,
        task_id: impl Into<String>,
        write_idx: i64,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            user_id: checkpoint.user_id.clone(),
            thread_id: checkpoint.thread_id.clone(),
            checkpoint_ns: checkpoint.checkpoint_ns.clone(),
            checkpoint_id: checkpoint.checkpoint_id.clone(),
            task_id: task_id.into(),
            write_idx,
            channel: channel.into(),
            value_type: "json".to_string(),
            value: "null".to_string(),
            created_at: now(),
        }
    }

    /// Builder: Set the serialized value and its serializer tag
    pub fn with_value(mut self, value_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.value_type = value_type.into();
        self.value = value.into();
        self
    }

    /// Decode a JSON-serialized value
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.value)
    }

    /// Key of the checkpoint this write belongs to
    pub(crate) fn checkpoint_key(&self) -> (&str, &str, &str, &str) {
        (
            &self.user_id,
            &self.thread_id,
            &self.checkpoint_ns,
            &self.checkpoint_id,
        )
    }
}

impl Storable for LangGraphCheckpointWrite {
    fn schema() -> &'static TableSchema {
        &CHECKPOINT_WRITE_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.user_id).into(),
            (&self.thread_id).into(),
            (&self.checkpoint_ns).into(),
            (&self.checkpoint_id).into(),
            (&self.task_id).into(),
            self.write_idx.into(),
            (&self.channel).into(),
            (&self.value_type).into(),
            (&self.value).into(),
            (&self.created_at).into(),
        ]
    }
}

/// A checkpoint together with its ordered writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointTuple {
    pub checkpoint: LangGraphCheckpoint,
    pub writes: Vec<LangGraphCheckpointWrite>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_content_ignores_timestamps() {
        let a = LangGraphCheckpoint::new("u", "t", "", "1").with_metadata(r#"{"step":1}"#);
        let mut b = a.clone();
        b.created_at = "2000-01-01T00:00:00.000000Z".to_string();
        assert!(a.same_content(&b));

        let meta: serde_json::Value = b.decode_metadata().unwrap();
        assert_eq!(meta["step"], 1);

        b.metadata = r#"{"step":2}"#.to_string();
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_write_inherits_checkpoint_key() {
        let checkpoint = LangGraphCheckpoint::new("u", "t", "ns", "1");
        let write = LangGraphCheckpointWrite::new(&checkpoint, "task", 0, "messages")
            .with_value("json", "[1,2]");
        assert_eq!(write.checkpoint_key(), checkpoint.key());
        let value: Vec<i32> = write.payload().unwrap();
        assert_eq!(value, vec![1, 2]);
    }
}
