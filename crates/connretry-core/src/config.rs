use crate::retry::{CodeSetLookup, PolicyError, RetryPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Retry policy parameters (`[retry]` section in config.toml).
///
/// Within a `[retry]` section, omitting `connect_timeout_ms` disables the
/// overall timeout; a config without the section gets the 15s default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of re-attempts after the first attempt, on transient errors only.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay in milliseconds before each re-attempt.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Ceiling in milliseconds on the whole connection process. None = no timeout.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_interval_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_interval_ms: default_retry_interval_ms(),
            connect_timeout_ms: Some(15_000),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> Result<RetryPolicy, PolicyError> {
        RetryPolicy::from_millis(
            self.max_retries,
            self.retry_interval_ms,
            self.connect_timeout_ms,
        )
    }
}

/// Transient error classification (`[transient]` section in config.toml).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransientConfig {
    /// Error codes treated as transient in addition to the built-in table.
    pub extra_codes: Vec<u32>,
    /// If true, only `extra_codes` are transient and the built-in table is ignored.
    pub replace_defaults: bool,
}

impl TransientConfig {
    pub fn to_lookup(&self) -> CodeSetLookup {
        let extra = self.extra_codes.iter().copied();
        if self.replace_defaults {
            CodeSetLookup::new(extra)
        } else {
            CodeSetLookup::with_defaults(extra)
        }
    }
}

/// Global configuration loaded from `~/.config/connretry/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnretryConfig {
    pub retry: RetryConfig,
    pub transient: TransientConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("connretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ConnretryConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ConnretryConfig::default();
        let toml = to_toml_string(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Serialize a config the way it is written to disk.
pub fn to_toml_string(cfg: &ConnretryConfig) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}

/// Load configuration from an explicit file. Missing keys take their defaults.
pub fn load_from_path(path: &Path) -> Result<ConnretryConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: ConnretryConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.retry
        .to_policy()
        .with_context(|| format!("invalid [retry] section in {}", path.display()))?;
    Ok(cfg)
}
