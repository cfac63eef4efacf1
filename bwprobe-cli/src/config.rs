//! Configuration loading and parsing

use anyhow::{Context, Result};
use bwprobe_core::ProbeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Target data file the probes read
    pub file: PathBuf,
    /// Event script to replay ("-" for stdin)
    #[serde(default)]
    pub script: Option<PathBuf>,
}

/// Identity overrides; unset fields fall back to the environment
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NodeConfig {
    pub hostname: Option<String>,
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Print probe results as JSON lines on stdout
    #[serde(default)]
    pub json: bool,
}

/// Load and parse a TOML configuration file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    Ok(config)
}
