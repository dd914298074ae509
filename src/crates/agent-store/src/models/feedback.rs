//! User feedback model

use crate::db::engine::{SqlValue, Storable};
use crate::db::schema::{Column, Index, TableSchema};
use crate::error::Result;
use crate::models::{decode, encode, now};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Feedback left by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    /// Generated on insert; 0 until stored
    pub id: i64,
    pub user_id: String,

    /// Feedback payload (JSON)
    pub data: String,

    pub created_at: String,
}

pub(crate) static FEEDBACK_SCHEMA: TableSchema = TableSchema {
    name: "feedback",
    columns: &[
        Column::serial("id"),
        Column::text("user_id"),
        Column::text("data"),
        Column::text("created_at"),
    ],
    primary_key: &["id"],
    indexes: &[Index {
        name: "user",
        columns: &["user_id"],
    }],
};

impl Feedback {
    pub fn new<T: Serialize>(user_id: impl Into<String>, payload: &T) -> Result<Self> {
        Ok(Self {
            id: 0,
            user_id: user_id.into(),
            data: encode(payload)?,
            created_at: now(),
        })
    }

    /// Decode the feedback payload
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.data)
    }
}

impl Storable for Feedback {
    fn schema() -> &'static TableSchema {
        &FEEDBACK_SCHEMA
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.user_id).into(),
            (&self.data).into(),
            (&self.created_at).into(),
        ]
    }
}
