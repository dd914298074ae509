//! # agent-store - Persistence layer for an agent control plane
//!
//! Durable storage for agents, sessions, tasks, event logs, tool registries,
//! push notification configs, feedback, LangGraph execution checkpoints and
//! CrewAI memory, on top of one SQLite or PostgreSQL database.
//!
//! ## Consistency contracts
//!
//! - **Idempotent upserts** - every `store_*` on a keyed entity is a single
//!   `INSERT ... ON CONFLICT DO UPDATE`, safe under concurrent writers.
//! - **Atomic composite writes** - checkpoint writes, event batches, tool
//!   reconciliation and cascading deletes run in one transaction each.
//! - **Exact reconciliation** - after `refresh_tools_for_server` a server's
//!   tool rows equal the supplied set.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agent_store::{Agent, AgentType, DatabaseConfig, DatabaseManager};
//!
//! # async fn example() -> agent_store::Result<()> {
//! let manager = DatabaseManager::open(&DatabaseConfig::sqlite("agents.db")).await?;
//! manager.initialize().await?;
//!
//! let repo = manager.repository();
//! repo.store_agent(&Agent::new("a1", AgentType::Declarative)).await?;
//! assert_eq!(repo.get_agent("a1").await?.agent_type, "declarative");
//!
//! manager.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod models;
pub mod repositories;

mod error;

#[cfg(test)]
mod testing;

// Error types
pub use error::{Result, StoreError};

// Re-export database and config types
pub use config::{load_config, ConfigLoader, DatabaseConfig, DatabaseType, StoreConfig};
pub use db::{manager::DatabaseManager, Database, Dialect};

// Re-export the repository façade
pub use repositories::Repository;

// Re-export models
pub use models::{
    Agent, AgentType, CheckpointTuple, CrewAiFlowState, CrewAiMemory, Event, EventListOptions,
    Feedback, LangGraphCheckpoint, LangGraphCheckpointWrite, PushNotification, Session, Task,
    Tool, ToolDefinition, ToolRefreshSummary, ToolServer,
};
