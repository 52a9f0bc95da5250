use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::relay::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_BYTES};
use crate::url_model::DEFAULT_EXTENSIONS;

/// Per-client rate limit (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Length of the fixed window in seconds.
    pub window_secs: u64,
    /// Requests allowed per client per window (0 = no limit).
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 15 * 60,
            max_requests: 100,
        }
    }
}

/// Global configuration loaded from `~/.config/vidrelay/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// Listening port. Overridden by `PORT`.
    pub port: u16,
    /// Ceiling on declared and actual bytes per transfer.
    pub max_bytes: u64,
    /// Largest chunk forwarded to the client in one write.
    pub chunk_size: usize,
    /// Allowed file extensions for the final URL path segment.
    pub allowed_extensions: Vec<String>,
    /// Deadline for the HEAD probe.
    pub probe_timeout_secs: u64,
    /// Deadline for establishing an upstream connection.
    pub connect_timeout_secs: u64,
    /// Maximum idle time between upstream reads while streaming.
    pub read_idle_timeout_secs: u64,
    /// Optional directory with a prebuilt UI served for non-API paths.
    pub static_dir: Option<PathBuf>,
    pub rate_limit: RateLimitConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            max_bytes: DEFAULT_MAX_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            probe_timeout_secs: 15,
            connect_timeout_secs: 10,
            read_idle_timeout_secs: 60,
            static_dir: None,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Applies process environment overrides (`PORT`, `VIDRELAY_BIND`,
    /// `VIDRELAY_MAX_BYTES`, `VIDRELAY_STATIC_DIR`).
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Like `apply_env` but reads variables through `lookup`. Unparseable values are
    /// ignored with a warning.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.port = p,
                Err(_) => tracing::warn!("ignoring invalid PORT value {:?}", port),
            }
        }
        if let Some(bind) = lookup("VIDRELAY_BIND") {
            if !bind.trim().is_empty() {
                self.bind_address = bind.trim().to_string();
            }
        }
        if let Some(max) = lookup("VIDRELAY_MAX_BYTES") {
            match max.trim().parse::<u64>() {
                Ok(n) => self.max_bytes = n,
                Err(_) => tracing::warn!("ignoring invalid VIDRELAY_MAX_BYTES value {:?}", max),
            }
        }
        if let Some(dir) = lookup("VIDRELAY_STATIC_DIR") {
            if !dir.trim().is_empty() {
                self.static_dir = Some(PathBuf::from(dir.trim()));
            }
        }
    }

    /// Rejects settings the relay cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_bytes == 0 {
            anyhow::bail!("max_bytes must be greater than zero");
        }
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than zero");
        }
        if self
            .allowed_extensions
            .iter()
            .all(|e| e.trim().trim_start_matches('.').is_empty())
        {
            anyhow::bail!("allowed_extensions must list at least one extension");
        }
        if self.rate_limit.max_requests > 0 && self.rate_limit.window_secs == 0 {
            anyhow::bail!("rate_limit.window_secs must be greater than zero");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vidrelay")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RelayConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RelayConfig::default();
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

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<RelayConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: RelayConfig = toml::from_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(cfg)
}
