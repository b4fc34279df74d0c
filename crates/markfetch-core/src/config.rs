use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Rejected configuration values. Loading fails on any of these so the worker
/// never starts with an undefined pool size or timeout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pool_size must be at least 1")]
    ZeroPoolSize,
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Worker configuration loaded from `~/.config/markfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// SQLite database shared with the bookmark application. None = XDG state dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    /// Number of reusable connection handles (maximum concurrent fetches).
    pub pool_size: usize,
    /// Maximum number of tasks read from the queue per schedule step.
    pub batch_size: usize,
    /// Connect timeout per request, in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout per request (including redirects), in seconds.
    pub request_timeout_secs: u64,
    /// Maximum number of redirects followed per request.
    pub max_redirects: u32,
    /// Readiness wait on the multi handle during the idle phase, in milliseconds.
    pub select_timeout_ms: u64,
    /// Extra sleep after the readiness wait, in milliseconds.
    pub idle_sleep_ms: u64,
    /// Response bytes kept per transfer; the rest is counted and discarded.
    pub max_body_bytes: usize,
    /// Optional User-Agent header for every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            pool_size: 10,
            batch_size: 20,
            connect_timeout_secs: 30,
            request_timeout_secs: 300,
            max_redirects: 5,
            select_timeout_ms: 1000,
            idle_sleep_ms: 2000,
            max_body_bytes: 16 * 1024,
            user_agent: None,
        }
    }
}

impl RetrieverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::ZeroPoolSize);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("connect_timeout_secs"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("request_timeout_secs"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn select_timeout(&self) -> Duration {
        Duration::from_millis(self.select_timeout_ms)
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("markfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the XDG path, creating a default file if none exists.
pub fn load_or_init() -> Result<RetrieverConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RetrieverConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path. A missing file is an error here.
pub fn load_from_path(path: &Path) -> Result<RetrieverConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: RetrieverConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
