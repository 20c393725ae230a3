//! Server configuration.
//!
//! Values come from `config.yaml` in the data directory when present, with
//! `PODSCRUB_*` environment variables taking precedence. Missing keys fall
//! back to defaults, so a bare install runs without any config file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: Option<PathBuf>,
    pub processor_url: Option<String>,
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8800,
            database_path: None,
            processor_url: None,
            cache_ttl_secs: 300,
        }
    }
}

impl Config {
    pub fn load(data_dir: &Path) -> Self {
        let config_path = data_dir.join("config.yaml");
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(content) => match serde_yaml::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!(
                        "Failed to parse {}: {} - using defaults",
                        config_path.display(),
                        e
                    );
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        };

        if let Ok(host) = std::env::var("PODSCRUB_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("PODSCRUB_PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => log::warn!("Ignoring non-numeric PODSCRUB_PORT: {port}"),
            }
        }
        if let Ok(path) = std::env::var("PODSCRUB_DATABASE_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }
        if let Ok(url) = std::env::var("PODSCRUB_PROCESSOR_URL") {
            config.processor_url = Some(url);
        }

        config
    }

    /// Default data directory: `~/.local/share/podscrub` (or the platform
    /// equivalent), falling back to the working directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("podscrub"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| data_dir.join("podscrub.db"))
    }
}
