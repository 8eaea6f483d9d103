use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    /// Bodies shorter than this (after trimming) are not valid JSON payloads.
    pub min_body_len: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            max_retries: 3,
            backoff_ms: 300,
            min_body_len: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub max_pages: usize,
    pub default_limit: usize,
    pub max_limit: usize,
    pub detail_selector: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            default_limit: 40,
            max_limit: 200,
            detail_selector: ".mw-parser-output, .bbWrapper, article".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub catalog_path: String,
    pub static_dir: Option<String>,
    pub user_agent: String,
    pub bazaar_url: String,
    /// `{tag}` is replaced with the canonical identifier.
    pub auction_history_url: String,
    pub patchnotes_url: String,
    pub forum_url: String,
    pub fetch: FetchConfig,
    pub scrape: ScrapeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 10000,
            catalog_path: "./items_merged.json".into(),
            static_dir: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) SkyblockLens/0.1".into(),
            bazaar_url: "https://api.hypixel.net/v2/skyblock/bazaar".into(),
            auction_history_url: "https://sky.coflnet.com/api/averageAuction?tag={tag}".into(),
            patchnotes_url: "https://wiki.hypixel.net/Patch_Notes".into(),
            forum_url: "https://hypixel.net/forums/skyblock-patch-notes.158/".into(),
            fetch: FetchConfig::default(),
            scrape: ScrapeConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Applies `PORT` and `CATALOG_PATH` on top of the file values.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT") {
            match port.trim().parse() {
                Ok(p) => self.port = p,
                Err(_) => warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(path) = lookup("CATALOG_PATH") {
            self.catalog_path = path;
        }
    }
}

/// Loads the config file if present, otherwise falls back to defaults.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let mut config = if Path::new(path).exists() {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)?
    } else {
        info!("No config file at {}, using defaults", path);
        AppConfig::default()
    };
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}
