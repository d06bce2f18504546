//! Configuration loading for the melodic event codec.
//!
//! The codec itself never reads global state: every encoder, decoder and
//! windower is constructed from an explicit [`CodecConfig`]. This crate is
//! where that value comes from when running the CLI.
//!
//! # Usage
//!
//! ```rust,no_run
//! use melodic_conf::MelodicConfig;
//!
//! let config = MelodicConfig::load().expect("Failed to load config");
//!
//! println!("Vocabulary dir: {}", config.paths.vocab_dir.display());
//! println!("Window length: {}", config.codec.sequence_length);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/melodic/config.toml` (system)
//! 2. `~/.config/melodic/config.toml` (user)
//! 3. `./melodic.toml` (local override, or the path given on the CLI)
//! 4. Environment variables (`MELODIC_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [codec]
//! preserve_offsets = true
//! preserve_durations = true
//! durations_separate = true
//! relative_offsets = true
//! sequence_length = 12
//!
//! [paths]
//! vocab_dir = "~/.local/share/melodic/vocab"
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod codec;
pub mod infra;
pub mod loader;

pub use codec::CodecConfig;
pub use infra::{PathsConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value in config file {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Complete melodic configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MelodicConfig {
    #[serde(default)]
    pub codec: CodecConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl MelodicConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with an explicit file taking the place of `./melodic.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = MelodicConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_from_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand so sections come out in a stable, commented order
        let mut output = String::new();

        output.push_str("# Melodic Configuration\n\n");

        output.push_str("[codec]\n");
        output.push_str(&format!(
            "preserve_offsets = {}\n",
            self.codec.preserve_offsets
        ));
        output.push_str(&format!(
            "preserve_durations = {}\n",
            self.codec.preserve_durations
        ));
        output.push_str(&format!(
            "durations_separate = {}\n",
            self.codec.durations_separate
        ));
        output.push_str(&format!(
            "relative_offsets = {}\n",
            self.codec.relative_offsets
        ));
        output.push_str(&format!(
            "sequence_length = {}\n",
            self.codec.sequence_length
        ));

        output.push_str("\n[paths]\n");
        output.push_str(&format!(
            "vocab_dir = \"{}\"\n",
            self.paths.vocab_dir.display()
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}
