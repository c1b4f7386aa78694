use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

/// Where the sound server lives and how long a single request may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Kept short on purpose: a hung request delays connectivity-loss
    /// detection by exactly this long.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Cadences for the three polling loops.
///
/// Connectivity is probed coarsely, the catalog diff runs fine-grained and
/// cheap, and the playback pass (one request per sound) sits in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_connection_interval_ms")]
    pub connection_interval_ms: u64,
    #[serde(default = "default_catalog_interval_ms")]
    pub catalog_interval_ms: u64,
    #[serde(default = "default_playback_interval_ms")]
    pub playback_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            connection_interval_ms: default_connection_interval_ms(),
            catalog_interval_ms: default_catalog_interval_ms(),
            playback_interval_ms: default_playback_interval_ms(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout_ms() -> u64 {
    1000
}

fn default_connection_interval_ms() -> u64 {
    500
}

fn default_catalog_interval_ms() -> u64 {
    100
}

fn default_playback_interval_ms() -> u64 {
    250
}

impl ServerConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl PollConfig {
    pub fn connection_interval(&self) -> Duration {
        Duration::from_millis(self.connection_interval_ms)
    }

    pub fn catalog_interval(&self) -> Duration {
        Duration::from_millis(self.catalog_interval_ms)
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms)
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
