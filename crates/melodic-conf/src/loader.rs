//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, MelodicConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/melodic/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("melodic/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("melodic.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and overlay every key it sets onto `config`.
pub fn load_from_file(config: &mut MelodicConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    overlay_toml(config, &contents, path)
}

/// Overlay the keys present in a TOML document. Absent keys keep their
/// current value, so later files only override what they mention.
pub(crate) fn overlay_toml(
    config: &mut MelodicConfig,
    contents: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Some(codec) = table.get("codec").and_then(|v| v.as_table()) {
        let flag = |name: &str| codec.get(name).and_then(|v| v.as_bool());
        if let Some(v) = flag("preserve_offsets") {
            config.codec.preserve_offsets = v;
        }
        if let Some(v) = flag("preserve_durations") {
            config.codec.preserve_durations = v;
        }
        if let Some(v) = flag("durations_separate") {
            config.codec.durations_separate = v;
        }
        if let Some(v) = flag("relative_offsets") {
            config.codec.relative_offsets = v;
        }
        if let Some(v) = codec.get("sequence_length").and_then(|v| v.as_integer()) {
            if v <= 0 {
                return Err(ConfigError::Invalid {
                    path: path.to_path_buf(),
                    message: format!("sequence_length must be positive, got {}", v),
                });
            }
            config.codec.sequence_length = v as usize;
        }
    }

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = paths.get("vocab_dir").and_then(|v| v.as_str()) {
            config.paths.vocab_dir = expand_path(v);
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    Ok(())
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut MelodicConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |name| env::var(name).ok());
}

/// Override logic with an injectable lookup so tests never touch the
/// process environment.
pub(crate) fn apply_overrides_from<F>(
    config: &mut MelodicConfig,
    sources: &mut ConfigSources,
    lookup: F,
) where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("MELODIC_VOCAB_DIR") {
        config.paths.vocab_dir = expand_path(&v);
        sources.env_overrides.push("MELODIC_VOCAB_DIR".to_string());
    }

    if let Some(v) = lookup("MELODIC_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("MELODIC_LOG_LEVEL".to_string());
    }
    // RUST_LOG wins over MELODIC_LOG_LEVEL, matching tracing-subscriber
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    if let Some(v) = lookup("MELODIC_SEQUENCE_LENGTH") {
        if let Ok(length) = v.parse::<usize>() {
            if length > 0 {
                config.codec.sequence_length = length;
                sources.env_overrides.push("MELODIC_SEQUENCE_LENGTH".to_string());
            }
        }
    }

    if let Some(v) = lookup("MELODIC_RELATIVE_OFFSETS") {
        config.codec.relative_offsets = v.to_lowercase() == "true" || v == "1";
        sources.env_overrides.push("MELODIC_RELATIVE_OFFSETS".to_string());
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
