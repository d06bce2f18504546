//! Infrastructure configuration - paths and logging.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem paths for persisted codec artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding vocabulary maps and codec settings.
    /// Default: ~/.local/share/melodic/vocab
    #[serde(default = "PathsConfig::default_vocab_dir")]
    pub vocab_dir: PathBuf,
}

impl PathsConfig {
    pub(crate) fn default_vocab_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".local/share/melodic/vocab"))
            .unwrap_or_else(|| PathBuf::from(".local/share/melodic/vocab"))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            vocab_dir: Self::default_vocab_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    pub(crate) fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
