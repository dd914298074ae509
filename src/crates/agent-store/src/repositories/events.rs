//! Event operations

use super::Repository;
use crate::db::engine::{self, Order, Query};
use crate::error::Result;
use crate::models::{timestamp, Event, EventListOptions};
use tracing::debug;

impl Repository {
    /// Store a batch of events in one transaction
    pub async fn store_events(&self, events: &[Event]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.db.begin().await?;
        for event in events {
            engine::save(&mut *tx, event).await?;
        }
        tx.commit().await?;

        debug!(count = events.len(), "Stored events");
        Ok(())
    }

    /// List a session's events
    ///
    /// Newest first unless `order_ascending` is set. `after` is an exclusive
    /// lower bound on `created_at`, so polling with the last seen timestamp
    /// never redelivers an event.
    pub async fn list_events_for_session(
        &self,
        session_id: &str,
        user_id: &str,
        options: &EventListOptions,
    ) -> Result<Vec<Event>> {
        let order = if options.order_ascending {
            Order::Asc
        } else {
            Order::Desc
        };

        let mut query = Query::new()
            .eq("session_id", session_id)
            .eq("user_id", user_id)
            .order_by("created_at", order)
            .order_by("id", order)
            .limit(options.limit);
        if let Some(after) = options.after {
            query = query.after("created_at", timestamp(after));
        }

        let mut conn = self.conn().await?;
        engine::list(&mut *conn, &query).await
    }

    /// Delete every event in a session
    pub async fn delete_events_for_session(&self, session_id: &str, user_id: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        let removed = engine::delete::<Event>(
            &mut *conn,
            &Query::new().eq("session_id", session_id).eq("user_id", user_id),
        )
        .await?;
        debug!(session_id = %session_id, removed, "Deleted session events");
        Ok(removed)
    }
}
