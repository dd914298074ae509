//! Configuration management for the store
//!
//! Configuration is resolved in three layers:
//! 1. Default values
//! 2. An optional TOML file
//! 3. `AGENT_STORE_*` environment variables

mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::{DatabaseConfig, DatabaseType, LoggingConfig, StoreConfig};

use crate::Result;
use std::path::Path;

/// Load configuration from an optional file plus environment overrides
pub async fn load_config(path: Option<&Path>) -> Result<StoreConfig> {
    let loader = match path {
        Some(path) => ConfigLoader::with_file(path),
        None => ConfigLoader::new(),
    };
    loader.load().await
}
