//! Configuration management for the dfs client
//!
//! The coordinator address is read from `config.toml` (or the file named
//! by `DFS_CONFIG`), then overridden by `DFS_MASTER_ADDR` /
//! `DFS_MASTER_PORT`. It is loaded again on every remote call.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_ENV: &str = "DFS_CONFIG";
pub const MASTER_ADDR_ENV: &str = "DFS_MASTER_ADDR";
pub const MASTER_PORT_ENV: &str = "DFS_MASTER_PORT";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coordinator host
    pub master_addr: String,

    /// Coordinator port, appended verbatim to the host (e.g. ":9000")
    pub master_port: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            master_addr: "127.0.0.1".to_string(),
            master_port: ":9000".to_string(),
        }
    }
}

impl Config {
    /// Address the coordinator is dialed at. Not validated.
    pub fn master_endpoint(&self) -> String {
        format!("{}{}", self.master_addr, self.master_port)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    pub fn with_overrides(mut self, addr: Option<String>, port: Option<String>) -> Self {
        if let Some(addr) = addr {
            self.master_addr = addr;
        }
        if let Some(port) = port {
            self.master_port = port;
        }
        self
    }
}

/// Get the config file path
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs = ProjectDirs::from("io", "tinydfs", "dfs-client")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Load configuration from file and environment
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    let config = if path.exists() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Config::from_toml(&content)?
    } else {
        Config::default()
    };

    Ok(config.with_overrides(
        std::env::var(MASTER_ADDR_ENV).ok(),
        std::env::var(MASTER_PORT_ENV).ok(),
    ))
}
