//! Agent operations

use super::Repository;
use crate::db::engine::{self, Query};
use crate::error::Result;
use crate::models::{now, Agent};
use tracing::debug;

impl Repository {
    /// Create or replace an agent
    pub async fn store_agent(&self, agent: &Agent) -> Result<()> {
        let mut agent = agent.clone();
        agent.updated_at = now();

        let mut conn = self.conn().await?;
        engine::save(&mut *conn, &agent).await?;
        debug!(agent_id = %agent.id, agent_type = %agent.agent_type, "Stored agent");
        Ok(())
    }

    /// Load an agent by ID
    pub async fn get_agent(&self, id: &str) -> Result<Agent> {
        let mut conn = self.conn().await?;
        engine::get(&mut *conn, &Query::new().eq("id", id)).await
    }

    /// List all agents, oldest first
    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        let mut conn = self.conn().await?;
        engine::list(&mut *conn, &Query::new()).await
    }

    /// Delete an agent; deleting a missing agent is not an error
    pub async fn delete_agent(&self, id: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let removed = engine::delete::<Agent>(&mut *conn, &Query::new().eq("id", id)).await?;
        debug!(agent_id = %id, removed, "Deleted agent");
        Ok(())
    }
}
