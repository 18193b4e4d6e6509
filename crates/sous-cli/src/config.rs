//! Configuration management for Sous CLI
//!
//! Stores the server URL and chat defaults in ~/.config/sous/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use sous::domain::value_objects::timeout_budget as budget_defaults;
use sous::TimeoutBudget;

const CONFIG_DIR: &str = "sous";
const CONFIG_FILE: &str = "config.toml";

/// CLI Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Client-tier wait limit in milliseconds.
    #[serde(default = "default_ui_timeout_ms")]
    pub ui_timeout_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_user_id() -> String {
    "local-user".to_string()
}

fn default_ui_timeout_ms() -> u64 {
    budget_defaults::DEFAULT_UI.as_millis() as u64
}

fn default_retry_attempts() -> u32 {
    budget_defaults::DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    budget_defaults::DEFAULT_RETRY_DELAY_BASE.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_id: default_user_id(),
            ui_timeout_ms: default_ui_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;

        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// The shared timeout budget as the client tier sees it. The server
    /// tiers keep their defaults; only the retry parameters and the UI
    /// limit are configurable here, and the ordering invariant still
    /// applies.
    pub fn budget(&self) -> Result<TimeoutBudget> {
        TimeoutBudget::new(
            budget_defaults::DEFAULT_AGENT_PROCESSING,
            budget_defaults::DEFAULT_GATEWAY,
            Duration::from_millis(self.ui_timeout_ms),
            self.retry_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
        .map_err(|e| anyhow::anyhow!(e))
    }
}
