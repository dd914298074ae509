//! Configuration loader
//!
//! Loads configuration from:
//! 1. Default values
//! 2. An optional TOML file
//! 3. `AGENT_STORE_*` environment variables
//!
//! Later layers override earlier ones.

use crate::config::schema::StoreConfig;
use crate::error::{Result, StoreError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Environment variable overriding `database.type`
pub const ENV_DATABASE_TYPE: &str = "AGENT_STORE_DATABASE_TYPE";
/// Environment variable overriding `database.sqlite_path`
pub const ENV_SQLITE_PATH: &str = "AGENT_STORE_SQLITE_PATH";
/// Environment variable overriding `database.postgres_url`
pub const ENV_POSTGRES_URL: &str = "AGENT_STORE_POSTGRES_URL";
/// Environment variable overriding `database.max_connections`
pub const ENV_MAX_CONNECTIONS: &str = "AGENT_STORE_MAX_CONNECTIONS";
/// Environment variable overriding `logging.level`
pub const ENV_LOG_LEVEL: &str = "AGENT_STORE_LOG_LEVEL";

/// Configuration loader that layers a file and the environment over defaults
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader that uses defaults plus environment only
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader that also reads the given TOML file
    pub fn with_file(path: impl AsRef<Path>) -> Self {
        Self {
            config_path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Get the configured file path, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Load configuration with environment overrides from the process environment
    pub async fn load(&self) -> Result<StoreConfig> {
        let env: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with("AGENT_STORE_"))
            .collect();
        self.load_with_env(&env).await
    }

    /// Load configuration with overrides taken from `env`
    pub async fn load_with_env(&self, env: &HashMap<String, String>) -> Result<StoreConfig> {
        let mut config = match self.config_path {
            Some(ref path) => {
                let config = Self::load_from_path(path).await?;
                debug!(path = %path.display(), "Loaded config file");
                config
            }
            None => StoreConfig::default(),
        };

        Self::apply_env_overrides(&mut config, env)?;
        config.database.validate()?;

        info!(
            database_type = %config.database.db_type,
            max_connections = config.database.max_connections,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    /// Load configuration from a specific path
    async fn load_from_path(path: &Path) -> Result<StoreConfig> {
        if !path.exists() {
            return Err(StoreError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| StoreError::config(format!("Failed to parse config: {}", e)))
    }

    fn apply_env_overrides(config: &mut StoreConfig, env: &HashMap<String, String>) -> Result<()> {
        if let Some(value) = env.get(ENV_DATABASE_TYPE) {
            config.database.db_type = value.parse()?;
        }
        if let Some(value) = env.get(ENV_SQLITE_PATH) {
            config.database.sqlite_path = PathBuf::from(value);
        }
        if let Some(value) = env.get(ENV_POSTGRES_URL) {
            config.database.postgres_url = Some(value.clone());
        }
        if let Some(value) = env.get(ENV_MAX_CONNECTIONS) {
            config.database.max_connections = value.parse().map_err(|_| {
                StoreError::config(format!("{} must be a positive integer", ENV_MAX_CONNECTIONS))
            })?;
        }
        if let Some(value) = env.get(ENV_LOG_LEVEL) {
            config.logging.level = value.clone();
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
