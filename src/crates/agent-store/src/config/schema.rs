//! Configuration schema for the store

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Path value that selects an in-memory SQLite database
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Top-level store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoreConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Embedded SQLite (file or in-memory)
    #[default]
    Sqlite,
    /// Networked PostgreSQL
    Postgres,
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DatabaseType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(StoreError::config(format!(
                "Unsupported database type: {}. Supported types: sqlite, postgres",
                other
            ))),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Backend type
    #[serde(rename = "type", default)]
    pub db_type: DatabaseType,

    /// SQLite database file, or `:memory:`
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    /// PostgreSQL connection URL (supports `${VAR}` expansion)
    #[serde(default)]
    pub postgres_url: Option<String>,

    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("agent-store.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::default(),
            sqlite_path: default_sqlite_path(),
            postgres_url: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    /// SQLite database at the given file path
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            sqlite_path: path.into(),
            ..Self::default()
        }
    }

    /// In-memory SQLite database
    pub fn in_memory() -> Self {
        Self::sqlite(IN_MEMORY_PATH)
    }

    /// PostgreSQL database at the given URL
    pub fn postgres(url: impl Into<String>) -> Self {
        Self {
            db_type: DatabaseType::Postgres,
            postgres_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Builder method to set the pool size
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Whether this selects an in-memory SQLite database
    pub fn is_in_memory(&self) -> bool {
        self.db_type == DatabaseType::Sqlite && self.sqlite_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Check the configuration for values that can never connect
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(StoreError::config("max_connections must be at least 1"));
        }

        match self.db_type {
            DatabaseType::Sqlite => {
                if self.sqlite_path.as_os_str().is_empty() {
                    return Err(StoreError::config("sqlite_path must not be empty"));
                }
            }
            DatabaseType::Postgres => match self.postgres_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                Some(url) => {
                    return Err(StoreError::config(format!(
                        "postgres_url must start with postgres:// or postgresql://, got: {}",
                        redact_url(url)
                    )));
                }
                None => {
                    return Err(StoreError::config(
                        "postgres_url is required when type = \"postgres\"",
                    ));
                }
            },
        }

        Ok(())
    }

    /// Build the driver connection URL
    pub fn connection_url(&self) -> Result<String> {
        self.validate()?;

        match self.db_type {
            DatabaseType::Sqlite if self.is_in_memory() => Ok("sqlite::memory:".to_string()),
            DatabaseType::Sqlite => {
                let path = self.sqlite_path.to_str().ok_or_else(|| {
                    StoreError::config("sqlite_path is not valid UTF-8")
                })?;
                Ok(format!("sqlite://{}?mode=rwc", path))
            }
            DatabaseType::Postgres => Ok(expand_env_var(
                self.postgres_url.as_deref().unwrap_or_default(),
            )),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Expand a whole-value `${VAR_NAME}` reference
pub(crate) fn expand_env_var(value: &str) -> String {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}

/// Strip credentials from a URL before it reaches a log line or error
pub(crate) fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
