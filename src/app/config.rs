//! Configuration for the output area

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::render::{DisplayOrder, DEFAULT_DISPLAY_ORDER};

/// Output area configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// MIME types in priority order, richest first
    pub display_order: Vec<String>,
    /// Evaluate `application/javascript` outputs (needs a script engine)
    pub allow_scripts: bool,
    /// Turn URLs in console text into links
    pub autolink_urls: bool,
    /// Insert images through reserved slots filled later
    pub defer_images: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_order: DEFAULT_DISPLAY_ORDER.iter().map(|t| t.to_string()).collect(),
            allow_scripts: false,
            autolink_urls: true,
            defer_images: false,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from default location or return default config
    pub fn load_or_default() -> Self {
        // Try to load from ~/.config/display-area/config.json
        if let Some(config_path) = default_path() {
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(err) => tracing::warn!("Ignoring {}: {}", config_path.display(), err),
                }
            }
        }
        Self::default()
    }

    pub fn display_order(&self) -> DisplayOrder {
        DisplayOrder::new(self.display_order.clone())
    }
}

/// Path of the per-user config file
pub fn default_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("display-area")
            .join("config.json")
    })
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
