use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{paths, release};

#[cfg(test)]
mod tests;

/// Build-time defaults, optionally overridden by a file baked into the
/// base image. Command-line flags and environment variables always win
/// over the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Repository channel for the default install strategy
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Package repository base URL
    #[serde(default = "default_repo_url")]
    pub repo_url: String,

    /// Release installed when no version is requested
    #[serde(default = "default_version")]
    pub version: String,

    /// Packages installed by the repository and archive strategies
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
}

fn default_channel() -> String {
    release::DEFAULT_CHANNEL.to_string()
}

fn default_repo_url() -> String {
    release::DEFAULT_REPO_URL.to_string()
}

fn default_version() -> String {
    release::DEFAULT_VERSION.to_string()
}

fn default_packages() -> Vec<String> {
    release::DEFAULT_PACKAGES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            repo_url: default_repo_url(),
            version: default_version(),
            packages: default_packages(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var_os("DBSTRAP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(paths::CONFIG_FILE));
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            return Ok(config);
        }
        Ok(Config::default())
    }
}
