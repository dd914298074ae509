//! LangGraph checkpoint operations
//!
//! Checkpoint stores are idempotent: re-storing identical content succeeds,
//! re-storing a key with different content is a conflict. The check is made
//! with `INSERT ... ON CONFLICT DO NOTHING` followed by a comparison, so two
//! racing writers of the same key cannot both "win".
//!
//! Writes are only ever stored inside a transaction that also confirms their
//! checkpoint row exists; a batch naming a missing checkpoint is rejected whole.
//! Every transaction here opens with a write, so SQLite takes the write lock
//! up front and concurrent callers wait on `busy_timeout` instead of failing.

use super::Repository;
use crate::db::engine::{self, Order, Query};
use crate::error::{Result, StoreError};
use crate::models::{CheckpointTuple, LangGraphCheckpoint, LangGraphCheckpointWrite};
use sqlx::AnyConnection;
use std::collections::BTreeSet;
use tracing::{debug, warn};

fn checkpoint_query((user_id, thread_id, ns, checkpoint_id): (&str, &str, &str, &str)) -> Query {
    Query::new()
        .eq("user_id", user_id)
        .eq("thread_id", thread_id)
        .eq("checkpoint_ns", ns)
        .eq("checkpoint_id", checkpoint_id)
}

async fn put_checkpoint(conn: &mut AnyConnection, checkpoint: &LangGraphCheckpoint) -> Result<()> {
    if engine::insert_if_absent(conn, checkpoint).await? {
        debug!(
            thread_id = %checkpoint.thread_id,
            checkpoint_id = %checkpoint.checkpoint_id,
            "Stored checkpoint"
        );
        return Ok(());
    }

    let existing: LangGraphCheckpoint = engine::get(conn, &checkpoint_query(checkpoint.key())).await?;
    if existing.same_content(checkpoint) {
        debug!(
            thread_id = %checkpoint.thread_id,
            checkpoint_id = %checkpoint.checkpoint_id,
            "Checkpoint already stored"
        );
        return Ok(());
    }

    warn!(
        thread_id = %checkpoint.thread_id,
        checkpoint_ns = %checkpoint.checkpoint_ns,
        checkpoint_id = %checkpoint.checkpoint_id,
        "Rejected checkpoint with conflicting content"
    );
    Err(StoreError::conflict(format!(
        "checkpoint {} in thread {} already stored with different content",
        checkpoint.checkpoint_id, checkpoint.thread_id
    )))
}

/// Save `writes`, then fail if any of their checkpoints is missing
///
/// Must run inside a transaction so a failed check discards the saved rows.
async fn put_writes(conn: &mut AnyConnection, writes: &[LangGraphCheckpointWrite]) -> Result<()> {
    for write in writes {
        engine::save(conn, write).await?;
    }

    let checkpoints: BTreeSet<_> = writes.iter().map(|w| w.checkpoint_key()).collect();
    for key in checkpoints {
        if engine::count::<LangGraphCheckpoint>(conn, &checkpoint_query(key)).await? == 0 {
            return Err(StoreError::invalid_state(format!(
                "writes reference missing checkpoint {} in thread {}",
                key.3, key.1
            )));
        }
    }
    Ok(())
}

impl Repository {
    /// Store a checkpoint
    ///
    /// Returns `Conflict` if the key is already stored with different content.
    pub async fn store_checkpoint(&self, checkpoint: &LangGraphCheckpoint) -> Result<()> {
        let mut conn = self.conn().await?;
        put_checkpoint(&mut *conn, checkpoint).await
    }

    /// Store a batch of writes atomically
    ///
    /// Either every write lands or none does. Every referenced checkpoint must
    /// already exist, otherwise the batch fails with `InvalidState`.
    pub async fn store_checkpoint_writes(&self, writes: &[LangGraphCheckpointWrite]) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let mut tx = self.db.begin().await?;
        put_writes(&mut *tx, writes).await?;
        tx.commit().await?;

        debug!(count = writes.len(), "Stored checkpoint writes");
        Ok(())
    }

    /// Store a checkpoint and its writes in one transaction
    pub async fn store_checkpoint_with_writes(
        &self,
        checkpoint: &LangGraphCheckpoint,
        writes: &[LangGraphCheckpointWrite],
    ) -> Result<()> {
        let mut tx = self.db.begin().await?;
        put_checkpoint(&mut *tx, checkpoint).await?;
        put_writes(&mut *tx, writes).await?;
        tx.commit().await?;
        Ok(())
    }

    /// List checkpoints of one thread namespace with their writes
    ///
    /// With `checkpoint_id`, returns that checkpoint alone (or nothing if it is
    /// absent). Otherwise returns the newest `limit` checkpoints by
    /// `checkpoint_id` descending; `limit` 0 means all of them. Writes are
    /// ordered by `(task_id, write_idx)`.
    pub async fn list_checkpoints(
        &self,
        user_id: &str,
        thread_id: &str,
        checkpoint_ns: &str,
        checkpoint_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CheckpointTuple>> {
        let mut query = Query::new()
            .eq("user_id", user_id)
            .eq("thread_id", thread_id)
            .eq("checkpoint_ns", checkpoint_ns);
        query = match checkpoint_id {
            Some(id) => query.eq("checkpoint_id", id),
            None => query.order_by("checkpoint_id", Order::Desc).limit(limit),
        };

        let mut conn = self.conn().await?;
        let checkpoints: Vec<LangGraphCheckpoint> = engine::list(&mut *conn, &query).await?;

        let mut tuples = Vec::with_capacity(checkpoints.len());
        for checkpoint in checkpoints {
            let writes = engine::list(
                &mut *conn,
                &checkpoint_query(checkpoint.key())
                    .order_by("task_id", Order::Asc)
                    .order_by("write_idx", Order::Asc),
            )
            .await?;
            tuples.push(CheckpointTuple { checkpoint, writes });
        }
        Ok(tuples)
    }

    /// Delete every checkpoint and write of a thread, across all namespaces
    pub async fn delete_checkpoint(&self, user_id: &str, thread_id: &str) -> Result<()> {
        let thread = Query::new().eq("user_id", user_id).eq("thread_id", thread_id);

        let mut tx = self.db.begin().await?;
        let writes = engine::delete::<LangGraphCheckpointWrite>(&mut *tx, &thread).await?;
        let checkpoints = engine::delete::<LangGraphCheckpoint>(&mut *tx, &thread).await?;
        tx.commit().await?;

        debug!(thread_id = %thread_id, checkpoints, writes, "Deleted thread checkpoints");
        Ok(())
    }
}
