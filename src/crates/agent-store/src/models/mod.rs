//! Domain models for the store
//!
//! Each model is a storable record: a plain struct decoded with `sqlx::FromRow`,
//! a static table schema, and builder helpers. Opaque payloads are kept as JSON
//! text and exposed through typed `payload()` accessors.
//!
//! Models with nullable columns implement `FromRow` by hand on top of
//! [`nullable_text`](crate::db::engine::nullable_text).

pub mod agent;
pub mod checkpoint;
pub mod crewai;
pub mod event;
pub mod feedback;
pub mod push_notification;
pub mod session;
pub mod task;
pub mod tool;

pub use agent::{Agent, AgentType};
pub use checkpoint::{CheckpointTuple, LangGraphCheckpoint, LangGraphCheckpointWrite};
pub use crewai::{CrewAiFlowState, CrewAiMemory};
pub use event::{Event, EventListOptions};
pub use feedback::Feedback;
pub use push_notification::PushNotification;
pub use session::Session;
pub use task::Task;
pub use tool::{Tool, ToolDefinition, ToolRefreshSummary, ToolServer};

use crate::error::{Result, StoreError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Render a timestamp in the fixed-width stored form
///
/// Always `YYYY-MM-DDTHH:MM:SS.ffffffZ`, so text order equals time order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time in the stored form
pub fn now() -> String {
    timestamp(Utc::now())
}

/// Fresh random identifier for records the caller does not name
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parse a stored timestamp
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::invalid_state(format!("Bad timestamp {:?}: {}", value, e)))
}

pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(data: &str) -> Result<T> {
    Ok(serde_json::from_str(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(timestamp(whole), "2024-01-01T00:00:00.000000Z");
        assert_eq!(now().len(), timestamp(whole).len());
    }

    #[test]
    fn test_timestamp_text_order_matches_time_order() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(timestamp(earlier) < timestamp(later));
    }

    #[test]
    fn test_parse_timestamp_round_trip() {
        let at = Utc.with_ymd_and_hms(2024, 6, 30, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp(&timestamp(at)).unwrap(), at);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
