//! Configuration loading and discovery for `cmapmerge.toml`
//!
//! Provides functions to find, load, and override configuration.

use super::schema::CmapConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "cmapmerge.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse cmapmerge.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Drop stream comments
    pub no_comments: Option<bool>,
    /// Suppress the local palette warning
    pub no_warnings: Option<bool>,
    /// Loop count for the merged stream
    pub loop_count: Option<u16>,
    /// Compact JSON output
    pub compact: Option<bool>,
    /// PNG scale factor
    pub scale: Option<u8>,
}

/// Find cmapmerge.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for cmapmerge.toml
/// 2. Check XDG_CONFIG_HOME/cmapmerge/cmapmerge.toml (or ~/.config/cmapmerge/cmapmerge.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find cmapmerge.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("cmapmerge").join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find cmapmerge.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a cmapmerge.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<CmapConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(CmapConfig::default()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<CmapConfig, ConfigError> {
    log::debug!("loading config from {}", path.display());
    let contents = fs::read_to_string(path)?;
    let config: CmapConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut CmapConfig, overrides: &CliOverrides) {
    if let Some(no_comments) = overrides.no_comments {
        config.merge.no_comments = no_comments;
    }

    if let Some(no_warnings) = overrides.no_warnings {
        config.merge.warn_local_palettes = !no_warnings;
    }

    if let Some(loop_count) = overrides.loop_count {
        config.merge.loop_count = Some(loop_count);
    }

    if let Some(compact) = overrides.compact {
        config.output.pretty = !compact;
    }

    if let Some(scale) = overrides.scale {
        config.output.scale = scale;
    }
}
