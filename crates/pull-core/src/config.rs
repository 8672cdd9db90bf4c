use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::job::DEFAULT_USER_AGENT;

/// Global configuration loaded from `~/.config/pull/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullConfig {
    /// Chunk count when `--concurrency` is not given (None = 2 × CPUs).
    pub concurrency: Option<usize>,
    /// Value of the `User-Agent` header unless a `-H` flag overrides it.
    pub user_agent: String,
    /// Extra headers sent with every request, before `-H` flags are applied.
    pub headers: BTreeMap<String, String>,
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Abort a transfer after this many seconds without data (None = wait forever).
    pub stall_timeout_secs: Option<u64>,
    /// Maximum redirects followed by the probe and each chunk.
    pub max_redirects: u32,
    /// Spinner redraw interval in milliseconds.
    pub render_interval_ms: u64,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: BTreeMap::new(),
            connect_timeout_secs: 30,
            stall_timeout_secs: None,
            max_redirects: 10,
            render_interval_ms: 100,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pull")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PullConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PullConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: PullConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
