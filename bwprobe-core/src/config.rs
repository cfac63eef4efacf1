//! Probe configuration
//!
//! Minimal configuration for the core library. Application-level concerns
//! (event scripts, output formats) live in the CLI layer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the bandwidth probe engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Number of slices the target file is partitioned into for partial reads
    #[serde(default = "default_divisions")]
    pub divisions: u64,

    /// What to do when a partial read lands past end-of-file
    #[serde(default)]
    pub read_policy: ReadPolicy,

    /// Directory the per-host telemetry log is written to
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

/// Policy for partial reads whose offset arithmetic exceeds the file size
///
/// With `divisions` slices and node index near the upper bound, the slice
/// offset can land past end-of-file when the size is not evenly divisible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadPolicy {
    /// Clamp the request to the bytes remaining and report what was read
    #[default]
    BestEffort,
    /// Fail the probe with an out-of-bounds error
    Strict,
}

fn default_divisions() -> u64 {
    100
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            divisions: default_divisions(),
            read_policy: ReadPolicy::default(),
            log_dir: default_log_dir(),
        }
    }
}

impl ProbeConfig {
    /// Create a configuration with default settings (100 divisions,
    /// best-effort reads, logs under /tmp)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the partition count for partial reads
    pub fn with_divisions(mut self, divisions: u64) -> Self {
        self.divisions = divisions;
        self
    }

    /// Builder method: set the out-of-bounds read policy
    pub fn with_read_policy(mut self, policy: ReadPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    /// Builder method: set the telemetry log directory
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::new();
        assert_eq!(config.divisions, 100);
        assert_eq!(config.read_policy, ReadPolicy::BestEffort);
        assert_eq!(config.log_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_builder() {
        let config = ProbeConfig::new()
            .with_divisions(10)
            .with_read_policy(ReadPolicy::Strict)
            .with_log_dir("/var/log/probe");
        assert_eq!(config.divisions, 10);
        assert_eq!(config.read_policy, ReadPolicy::Strict);
        assert_eq!(config.log_dir, PathBuf::from("/var/log/probe"));
    }

    #[test]
    fn test_serde_defaults() {
        let config: ProbeConfig = toml_like_empty();
        assert_eq!(config.divisions, 100);
        assert_eq!(config.read_policy, ReadPolicy::BestEffort);
    }

    fn toml_like_empty() -> ProbeConfig {
        serde_json::from_str("{}").unwrap()
    }
}
