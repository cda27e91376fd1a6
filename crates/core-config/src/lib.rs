//! Configuration loading and parsing.
//!
//! Parses `scrawl.toml` (or an override path provided by the binary). All
//! sections and fields are optional with sensible defaults; unknown fields
//! are ignored so the file format can evolve without breaking older builds.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

/// Default discovery filename in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "scrawl.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SessionConfig {
    /// Display name sent with cursor events; the server may override it.
    #[serde(default)]
    pub username: Option<String>,
    /// Join the document without edit rights; local mutations are ignored.
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    /// Endpoint of the collaboration server.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogConfig {
    /// EnvFilter directive string, e.g. `info,editor.rebase=trace`.
    #[serde(default)]
    pub filter: Option<String>,
    /// Log file path; stderr when absent.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    pub fn username(&self) -> &str {
        self.session.username.as_deref().unwrap_or("anonymous")
    }
}

/// Load configuration from `override_path`, or from `scrawl.toml` in the
/// working directory. A missing file yields the defaults; a malformed file
/// is an error.
pub fn load_from(override_path: Option<PathBuf>) -> Result<Config> {
    let (path, explicit) = match override_path {
        Some(p) => (p, true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if !path.exists() {
        if explicit {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config: Config = toml::from_str(&raw)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    info!(target: "config", path = %path.display(), "config_loaded");
    Ok(config)
}
