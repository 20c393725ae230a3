pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod segments;
pub mod server;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use config::Config;
use database::Database;
use jobs::JobsManager;
use server::Server;

/// Wire everything up and serve until shutdown.
pub async fn run(config: Config, data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let db_path = config.database_path(data_dir);
    let db = Arc::new(
        Database::new(&db_path)
            .with_context(|| format!("Failed to initialize database at {}", db_path.display()))?,
    );
    log::info!("Database ready at {}", db_path.display());

    let jobs = Arc::new(JobsManager::new(config.processor_url.as_deref()));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    Server::new(
        db,
        jobs,
        addr,
        Duration::from_secs(config.cache_ttl_secs),
    )
    .start()
    .await
    .context("Server exited with an error")
}
