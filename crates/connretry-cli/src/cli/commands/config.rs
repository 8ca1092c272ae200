//! `connretry config` – print the effective configuration.

use anyhow::{Context, Result};
use connretry_core::config::{self, ConnretryConfig};
use std::path::Path;

pub fn run_config(cfg: &ConnretryConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    let toml = config::to_toml_string(cfg).context("serialize config")?;
    println!("# {}", path.display());
    print!("{}", toml);
    Ok(())
}
