//! Feedback operations

use super::Repository;
use crate::db::engine::{self, Query};
use crate::error::Result;
use crate::models::Feedback;
use tracing::debug;

impl Repository {
    /// Append a feedback entry; its ID is generated by the backend
    pub async fn store_feedback(&self, feedback: &Feedback) -> Result<()> {
        let mut conn = self.conn().await?;
        engine::insert(&mut *conn, feedback).await?;
        debug!(user_id = %feedback.user_id, "Stored feedback");
        Ok(())
    }

    /// List a user's feedback, oldest first
    pub async fn list_feedback(&self, user_id: &str) -> Result<Vec<Feedback>> {
        let mut conn = self.conn().await?;
        engine::list(&mut *conn, &Query::new().eq("user_id", user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use crate::models::Feedback;
    use crate::testing::setup_repository;
    use serde_json::json;

    #[tokio::test]
    async fn test_feedback_gets_generated_ids() {
        let (_manager, repo) = setup_repository().await;
        let entry = Feedback::new("alice", &json!({"positive": true})).unwrap();
        repo.store_feedback(&entry).await.unwrap();
        repo.store_feedback(&entry).await.unwrap();
        repo.store_feedback(&Feedback::new("bob", &json!({})).unwrap())
            .await
            .unwrap();

        let stored = repo.list_feedback("alice").await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored[0].id > 0);
        assert_ne!(stored[0].id, stored[1].id);
    }
}
