//! agent-store admin CLI
//!
//! Creates, resets and checks the store's database schema.

use agent_store::{load_config, DatabaseManager, StoreConfig};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agent-store")]
#[command(about = "Manage the agent-store database", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// TOML config file (defaults plus AGENT_STORE_* variables when omitted)
    #[arg(short, long, env = "AGENT_STORE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create every table and index that does not exist yet
    Init,

    /// Drop every table
    Reset {
        /// Create the tables again after dropping them
        #[arg(long)]
        recreate: bool,
    },

    /// Check that the database is reachable
    Check,
}

fn init_tracing(config: &StoreConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    init_tracing(&config);

    let manager = DatabaseManager::open(&config.database)
        .await
        .context("Failed to open database")?;

    let result = match cli.command {
        Commands::Init => manager.initialize().await.map(|_| {
            println!("✓ Schema initialized ({} backend)", config.database.db_type);
        }),
        Commands::Reset { recreate } => manager.reset(recreate).await.map(|_| {
            if recreate {
                println!("✓ Schema dropped and recreated");
            } else {
                println!("✓ Schema dropped");
            }
        }),
        Commands::Check => manager.health_check().await.map(|_| {
            println!("✓ Database reachable ({} backend)", config.database.db_type);
        }),
    };

    manager.close().await;
    result.map_err(Into::into)
}
