use anyhow::Result;
use tracing_subscriber::EnvFilter;

use podscrub::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = Config::default_data_dir();
    let config = Config::load(&data_dir);

    log::info!(
        "podscrub starting on {}:{} (data dir {})",
        config.host,
        config.port,
        data_dir.display()
    );

    podscrub::run(config, &data_dir).await
}
