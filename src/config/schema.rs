//! Configuration schema types for `cmapmerge.toml`
//!
//! Defines the structure and validation rules for merge configuration.

use crate::merge::MergeOptions;
use serde::{Deserialize, Serialize};

/// Largest integer scale accepted for rendered previews
pub const MAX_SCALE: u8 = 16;

/// `[merge]` section: how streams are combined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Drop stream comments from merged inputs
    #[serde(default)]
    pub no_comments: bool,
    /// Warn once when a frame needs a local palette
    #[serde(default = "default_true")]
    pub warn_local_palettes: bool,
    /// Loop count for the merged stream, overriding the inputs'
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<u16>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { no_comments: false, warn_local_palettes: true, loop_count: None }
    }
}

impl MergeConfig {
    /// Session options for a [`crate::merge::Merger`].
    pub fn options(&self) -> MergeOptions {
        MergeOptions {
            no_comments: self.no_comments,
            warn_local_palettes: self.warn_local_palettes,
        }
    }
}

/// `[output]` section: how results are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON stream documents
    #[serde(default = "default_true")]
    pub pretty: bool,
    /// Default scale factor for rendered PNGs
    #[serde(default = "default_scale")]
    pub scale: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true, scale: default_scale() }
    }
}

fn default_true() -> bool {
    true
}

fn default_scale() -> u8 {
    1
}

/// Complete `cmapmerge.toml` configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmapConfig {
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// A single validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "output.scale")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cmapmerge.toml: '{}' {}", self.field, self.message)
    }
}

impl CmapConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.output.scale == 0 || self.output.scale > MAX_SCALE {
            errors.push(ConfigValidationError {
                field: "output.scale".to_string(),
                message: format!("must be between 1 and {}", MAX_SCALE),
            });
        }

        errors
    }
}
