//! CrewAI memory and flow state operations

use super::Repository;
use crate::db::engine::{self, Order, Query};
use crate::error::Result;
use crate::models::{CrewAiFlowState, CrewAiMemory};
use tracing::debug;

fn thread_query(user_id: &str, thread_id: &str) -> Query {
    Query::new().eq("user_id", user_id).eq("thread_id", thread_id)
}

impl Repository {
    /// Append a memory entry
    pub async fn store_crewai_memory(&self, memory: &CrewAiMemory) -> Result<()> {
        let mut conn = self.conn().await?;
        engine::insert(&mut *conn, memory).await?;
        debug!(thread_id = %memory.thread_id, "Stored CrewAI memory");
        Ok(())
    }

    /// Find memories whose `task_description` contains `task_description`
    ///
    /// Matching ignores ASCII case and runs in the backend against the JSON
    /// document. Results are newest first, ties broken by ascending `score`
    /// with unscored entries last. `limit` 0 means unlimited.
    pub async fn search_crewai_memory_by_task(
        &self,
        user_id: &str,
        thread_id: &str,
        task_description: &str,
        limit: usize,
    ) -> Result<Vec<CrewAiMemory>> {
        let dialect = self.db.dialect();
        let score = dialect.json_number("memory_data", "score");
        let query = thread_query(user_id, thread_id)
            .contains(
                dialect.json_text("memory_data", "task_description"),
                task_description,
            )
            .order_by("created_at", Order::Desc)
            .order_by_expr(format!("{} IS NULL", score), Order::Asc)
            .order_by_expr(score, Order::Asc)
            .order_by("id", Order::Asc)
            .limit(limit);

        let mut conn = self.conn().await?;
        engine::list(&mut *conn, &query).await
    }

    /// Forget every memory of a thread
    pub async fn reset_crewai_memory(&self, user_id: &str, thread_id: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        let removed =
            engine::delete::<CrewAiMemory>(&mut *conn, &thread_query(user_id, thread_id)).await?;
        debug!(thread_id = %thread_id, removed, "Reset CrewAI memory");
        Ok(removed)
    }

    /// Append a flow state snapshot
    pub async fn store_crewai_flow_state(&self, state: &CrewAiFlowState) -> Result<()> {
        let mut conn = self.conn().await?;
        engine::insert(&mut *conn, state).await?;
        debug!(thread_id = %state.thread_id, method = %state.method_name, "Stored CrewAI flow state");
        Ok(())
    }

    /// Most recent flow state of a thread, or `None` for a fresh thread
    pub async fn get_crewai_flow_state(
        &self,
        user_id: &str,
        thread_id: &str,
    ) -> Result<Option<CrewAiFlowState>> {
        let mut conn = self.conn().await?;
        engine::find(
            &mut *conn,
            &thread_query(user_id, thread_id)
                .order_by("created_at", Order::Desc)
                .order_by("id", Order::Desc),
        )
        .await
    }
}
