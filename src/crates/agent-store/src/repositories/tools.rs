//! Tool server and tool operations, including tool-set reconciliation

use super::Repository;
use crate::db::engine::{self, Query};
use crate::error::Result;
use crate::models::{now, Tool, ToolDefinition, ToolRefreshSummary, ToolServer};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

fn server_query(server_name: &str, group_kind: &str) -> Query {
    Query::new()
        .eq("server_name", server_name)
        .eq("group_kind", group_kind)
}

impl Repository {
    /// Create or replace a tool server
    pub async fn store_tool_server(&self, server: &ToolServer) -> Result<()> {
        let mut server = server.clone();
        server.updated_at = now();

        let mut conn = self.conn().await?;
        engine::save(&mut *conn, &server).await?;
        debug!(server = %server.name, group_kind = %server.group_kind, "Stored tool server");
        Ok(())
    }

    pub async fn get_tool_server(&self, name: &str, group_kind: &str) -> Result<ToolServer> {
        let mut conn = self.conn().await?;
        engine::get(
            &mut *conn,
            &Query::new().eq("name", name).eq("group_kind", group_kind),
        )
        .await
    }

    /// Record a successful tool discovery against a registered server
    pub async fn mark_tool_server_connected(
        &self,
        name: &str,
        group_kind: &str,
    ) -> Result<ToolServer> {
        let mut server = self.get_tool_server(name, group_kind).await?;
        server.mark_connected();

        let mut conn = self.conn().await?;
        engine::save(&mut *conn, &server).await?;
        debug!(server = %name, group_kind = %group_kind, "Marked tool server connected");
        Ok(server)
    }

    pub async fn list_tool_servers(&self) -> Result<Vec<ToolServer>> {
        let mut conn = self.conn().await?;
        engine::list(&mut *conn, &Query::new()).await
    }

    /// Delete a tool server together with all of its tools
    pub async fn delete_tool_server(&self, name: &str, group_kind: &str) -> Result<()> {
        let mut tx = self.db.begin().await?;
        let tools = engine::delete::<Tool>(&mut *tx, &server_query(name, group_kind)).await?;
        engine::delete::<ToolServer>(
            &mut *tx,
            &Query::new().eq("name", name).eq("group_kind", group_kind),
        )
        .await?;
        tx.commit().await?;

        debug!(server = %name, group_kind = %group_kind, tools, "Deleted tool server");
        Ok(())
    }

    /// List every tool of every server
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let mut conn = self.conn().await?;
        engine::list(&mut *conn, &Query::new()).await
    }

    /// List the tools of one server registration
    pub async fn list_tools_for_server(
        &self,
        server_name: &str,
        group_kind: &str,
    ) -> Result<Vec<Tool>> {
        let mut conn = self.conn().await?;
        engine::list(&mut *conn, &server_query(server_name, group_kind)).await
    }

    /// Replace a server's tool set with exactly `incoming`
    ///
    /// The current set is read first, then existing rows for the server are
    /// deleted and the incoming set inserted in one transaction, so a failure
    /// part way leaves the previous set intact. Tools present before and after
    /// keep their `created_at`. Duplicate names in `incoming` collapse to the
    /// last occurrence.
    ///
    /// Discovery against the server itself must happen before this call; the
    /// transaction only performs storage operations.
    pub async fn refresh_tools_for_server(
        &self,
        server_name: &str,
        group_kind: &str,
        incoming: &[ToolDefinition],
    ) -> Result<ToolRefreshSummary> {
        let wanted: BTreeMap<&str, &str> = incoming
            .iter()
            .map(|t| (t.name.as_str(), t.description.as_str()))
            .collect();
        let now = now();

        let created: HashMap<String, String> = self
            .list_tools_for_server(server_name, group_kind)
            .await?
            .into_iter()
            .map(|t| (t.id, t.created_at))
            .collect();

        // Opens with a write so SQLite takes the write lock immediately
        let mut tx = self.db.begin().await?;
        let removed =
            engine::delete::<Tool>(&mut *tx, &server_query(server_name, group_kind)).await?;

        let mut summary = ToolRefreshSummary::default();
        for (name, description) in &wanted {
            let created_at = match created.get(*name) {
                Some(created_at) => {
                    summary.retained += 1;
                    created_at.clone()
                }
                None => {
                    summary.added += 1;
                    now.clone()
                }
            };
            let tool = Tool {
                id: name.to_string(),
                server_name: server_name.to_string(),
                group_kind: group_kind.to_string(),
                description: description.to_string(),
                created_at,
                updated_at: now.clone(),
            };
            engine::insert(&mut *tx, &tool).await?;
        }
        summary.removed = (removed as usize).saturating_sub(summary.retained);

        tx.commit().await?;

        debug!(
            server = %server_name,
            group_kind = %group_kind,
            added = summary.added,
            removed = summary.removed,
            retained = summary.retained,
            "Refreshed tools"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::tool::{GROUP_KIND_MCP_SERVER, GROUP_KIND_REMOTE_MCP_SERVER};
    use crate::models::{ToolDefinition, ToolServer};
    use crate::testing::setup_repository;

    fn defs(names: &[&str]) -> Vec<ToolDefinition> {
        names
            .iter()
            .map(|n| ToolDefinition::new(*n, format!("{} tool", n)))
            .collect()
    }

    #[tokio::test]
    async fn test_refresh_replaces_tool_set() {
        let (_manager, repo) = setup_repository().await;

        let first = repo
            .refresh_tools_for_server("srv", GROUP_KIND_REMOTE_MCP_SERVER, &defs(&["toolA", "toolB"]))
            .await
            .unwrap();
        assert_eq!(first.added, 2);

        let before = repo
            .list_tools_for_server("srv", GROUP_KIND_REMOTE_MCP_SERVER)
            .await
            .unwrap();
        let tool_b_created = before.iter().find(|t| t.id == "toolB").unwrap().created_at.clone();

        let second = repo
            .refresh_tools_for_server("srv", GROUP_KIND_REMOTE_MCP_SERVER, &defs(&["toolB", "toolC"]))
            .await
            .unwrap();
        assert_eq!((second.added, second.removed, second.retained), (1, 1, 1));

        let mut names: Vec<_> = repo
            .list_tools_for_server("srv", GROUP_KIND_REMOTE_MCP_SERVER)
            .await
            .unwrap()
            .into_iter()
            .map(|t| {
                if t.id == "toolB" {
                    assert_eq!(t.created_at, tool_b_created);
                }
                t.id
            })
            .collect();
        names.sort();
        assert_eq!(names, vec!["toolB", "toolC"]);
    }

    #[tokio::test]
    async fn test_refresh_is_scoped_by_group_kind() {
        let (_manager, repo) = setup_repository().await;
        repo.refresh_tools_for_server("srv", GROUP_KIND_REMOTE_MCP_SERVER, &defs(&["a"]))
            .await
            .unwrap();
        repo.refresh_tools_for_server("srv", GROUP_KIND_MCP_SERVER, &defs(&["b"]))
            .await
            .unwrap();

        repo.refresh_tools_for_server("srv", GROUP_KIND_MCP_SERVER, &[])
            .await
            .unwrap();

        assert_eq!(repo.list_tools().await.unwrap().len(), 1);
        assert_eq!(
            repo.list_tools_for_server("srv", GROUP_KIND_REMOTE_MCP_SERVER)
                .await
                .unwrap()[0]
                .id,
            "a"
        );
    }

    #[tokio::test]
    async fn test_delete_tool_server_removes_tools() {
        let (_manager, repo) = setup_repository().await;
        let server = ToolServer::new("srv", GROUP_KIND_MCP_SERVER).with_description("local");
        repo.store_tool_server(&server).await.unwrap();
        repo.refresh_tools_for_server("srv", GROUP_KIND_MCP_SERVER, &defs(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(repo.list_tool_servers().await.unwrap().len(), 1);
        repo.delete_tool_server("srv", GROUP_KIND_MCP_SERVER).await.unwrap();

        assert!(repo
            .get_tool_server("srv", GROUP_KIND_MCP_SERVER)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(repo.list_tools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_tool_server_connected() {
        let (_manager, repo) = setup_repository().await;
        repo.store_tool_server(&ToolServer::new("srv", GROUP_KIND_REMOTE_MCP_SERVER))
            .await
            .unwrap();
        let fresh = repo
            .get_tool_server("srv", GROUP_KIND_REMOTE_MCP_SERVER)
            .await
            .unwrap();
        assert_eq!(fresh.last_connected, None);

        let marked = repo
            .mark_tool_server_connected("srv", GROUP_KIND_REMOTE_MCP_SERVER)
            .await
            .unwrap();
        let stored = repo
            .get_tool_server("srv", GROUP_KIND_REMOTE_MCP_SERVER)
            .await
            .unwrap();
        assert!(stored.last_connected.is_some());
        assert_eq!(stored.last_connected, marked.last_connected);
        assert_eq!(stored.created_at, fresh.created_at);

        assert!(repo
            .mark_tool_server_connected("missing", GROUP_KIND_REMOTE_MCP_SERVER)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_incoming_names_collapse() {
        let (_manager, repo) = setup_repository().await;
        let incoming = vec![
            ToolDefinition::new("a", "old"),
            ToolDefinition::new("a", "new"),
        ];
        let summary = repo
            .refresh_tools_for_server("srv", GROUP_KIND_MCP_SERVER, &incoming)
            .await
            .unwrap();
        assert_eq!(summary.added, 1);

        let tools = repo.list_tools_for_server("srv", GROUP_KIND_MCP_SERVER).await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].description, "new");
    }
}
