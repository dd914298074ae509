//! Session operations

use super::Repository;
use crate::db::engine::{self, Query};
use crate::error::Result;
use crate::models::{now, Session};
use tracing::debug;

impl Repository {
    /// Create or replace a session
    pub async fn store_session(&self, session: &Session) -> Result<()> {
        let mut session = session.clone();
        session.updated_at = now();

        let mut conn = self.conn().await?;
        engine::save(&mut *conn, &session).await?;
        debug!(session_id = %session.id, user_id = %session.user_id, "Stored session");
        Ok(())
    }

    pub async fn get_session(&self, id: &str, user_id: &str) -> Result<Session> {
        let mut conn = self.conn().await?;
        engine::get(&mut *conn, &Query::new().eq("id", id).eq("user_id", user_id)).await
    }

    /// List a user's sessions, oldest first
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        let mut conn = self.conn().await?;
        engine::list(&mut *conn, &Query::new().eq("user_id", user_id)).await
    }

    /// List a user's sessions served by one agent
    pub async fn list_sessions_for_agent(
        &self,
        agent_id: &str,
        user_id: &str,
    ) -> Result<Vec<Session>> {
        let mut conn = self.conn().await?;
        engine::list(
            &mut *conn,
            &Query::new().eq("agent_id", agent_id).eq("user_id", user_id),
        )
        .await
    }

    pub async fn delete_session(&self, id: &str, user_id: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        engine::delete::<Session>(&mut *conn, &Query::new().eq("id", id).eq("user_id", user_id))
            .await?;
        debug!(session_id = %id, user_id = %user_id, "Deleted session");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::Session;
    use crate::testing::setup_repository;

    #[tokio::test]
    async fn test_sessions_are_scoped_by_user() {
        let (_manager, repo) = setup_repository().await;

        repo.store_session(&Session::new("s1", "alice").with_agent("a1"))
            .await
            .unwrap();
        repo.store_session(&Session::new("s1", "bob").with_name("bob's chat"))
            .await
            .unwrap();
        repo.store_session(&Session::new("s2", "alice").with_agent("a2"))
            .await
            .unwrap();

        assert_eq!(repo.list_sessions("alice").await.unwrap().len(), 2);
        assert_eq!(
            repo.get_session("s1", "bob").await.unwrap().name.as_deref(),
            Some("bob's chat")
        );

        let for_agent = repo.list_sessions_for_agent("a1", "alice").await.unwrap();
        assert_eq!(for_agent.len(), 1);
        assert_eq!(for_agent[0].id, "s1");
        assert!(repo.list_sessions_for_agent("a1", "bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_session_leaves_other_users() {
        let (_manager, repo) = setup_repository().await;
        repo.store_session(&Session::new("s1", "alice")).await.unwrap();
        repo.store_session(&Session::new("s1", "bob")).await.unwrap();

        repo.delete_session("s1", "alice").await.unwrap();

        assert!(repo.get_session("s1", "alice").await.unwrap_err().is_not_found());
        assert!(repo.get_session("s1", "bob").await.is_ok());
    }

    #[tokio::test]
    async fn test_rename_session() {
        let (_manager, repo) = setup_repository().await;
        let session = Session::new("s1", "alice");
        repo.store_session(&session).await.unwrap();
        repo.store_session(&session.clone().with_name("renamed")).await.unwrap();

        let sessions = repo.list_sessions("alice").await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].name.as_deref(), Some("renamed"));
    }
}
