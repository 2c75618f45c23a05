use anyhow::{Context, Result};
use fairshare_core::EngineConfig;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{ensure_fairshare_home, fairshare_home};

pub fn config_path() -> Result<PathBuf> {
    Ok(fairshare_home()?.join("config.toml"))
}

/// Load the engine config from `explicit`, else the home config, else
/// defaults. An explicit path must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let p = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = config_path()?;
            if !p.exists() {
                tracing::debug!(path = %p.display(), "no config file; using defaults");
                return Ok(EngineConfig::default());
            }
            p
        }
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", p.display()))?;
    Ok(cfg)
}

pub fn render_config(cfg: &EngineConfig) -> Result<String> {
    toml::to_string_pretty(cfg).context("serialize config")
}

pub fn init_config() -> Result<()> {
    let p = ensure_fairshare_home()?.join("config.toml");
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let s = render_config(&EngineConfig::default())?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    println!("Wrote {}", p.display());
    Ok(())
}
