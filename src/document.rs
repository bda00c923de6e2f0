//! Stream documents: JSON files holding one indexed-color stream
//!
//! Documents are read with JSON5 (comments and trailing commas allowed) and
//! written as plain JSON. A document looks like:
//!
//! ```json
//! {
//!   "palette": ["#000000", "#ff0000"],
//!   "loop_count": 0,
//!   "comment": ["made by hand"],
//!   "frames": [
//!     {"image": {"width": 2, "height": 1, "data": [0, 1]}, "delay": 10, "transparent": 0}
//!   ]
//! }
//! ```

use crate::models::Stream;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error type for document operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed document text
    #[error("Failed to parse stream document: {0}")]
    Parse(String),
    /// Serialization error while writing
    #[error("Failed to write stream document: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Structurally valid but inconsistent content
    #[error("Invalid stream document:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<ValidationIssue>),
}

/// A single consistency problem found in a stream document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Index of the offending frame
    pub frame: usize,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame {}: {}", self.frame, self.message)
    }
}

/// Check that every pixel and transparent index fits its governing palette.
///
/// Frames without any governing palette are not reported here; merging
/// rejects them with a dedicated error.
pub fn validate_stream(stream: &Stream) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (index, frame) in stream.frames.iter().enumerate() {
        let Some(palette) = stream.palette_for(frame) else {
            continue;
        };
        let ncol = palette.len();

        let bad_pixel = frame.image.rows().enumerate().find_map(|(y, row)| {
            row.iter().position(|&px| px as usize >= ncol).map(|x| (x, y, row[x]))
        });
        if let Some((x, y, value)) = bad_pixel {
            issues.push(ValidationIssue {
                frame: index,
                message: format!(
                    "pixel value {} at ({}, {}) is outside the {}-color palette",
                    value, x, y, ncol
                ),
            });
        }

        if let Some(t) = frame.transparent {
            if t as usize >= ncol {
                issues.push(ValidationIssue {
                    frame: index,
                    message: format!(
                        "transparent index {} is outside the {}-color palette",
                        t, ncol
                    ),
                });
            }
        }
    }

    issues
}

/// Parse and validate a stream document.
pub fn parse_stream(text: &str) -> Result<Stream, DocumentError> {
    let stream: Stream = json5::from_str(text).map_err(|e| DocumentError::Parse(e.to_string()))?;
    let issues = validate_stream(&stream);
    if !issues.is_empty() {
        return Err(DocumentError::Validation(issues));
    }
    Ok(stream)
}

/// Read, parse, and validate a stream document from disk.
pub fn load_stream(path: &Path) -> Result<Stream, DocumentError> {
    let text = fs::read_to_string(path)?;
    parse_stream(&text)
}

/// Serialize a stream as JSON.
pub fn to_json(stream: &Stream, pretty: bool) -> Result<String, DocumentError> {
    let json =
        if pretty { serde_json::to_string_pretty(stream)? } else { serde_json::to_string(stream)? };
    Ok(json)
}

/// Write a stream document, creating parent directories as needed.
pub fn save_stream(stream: &Stream, path: &Path, pretty: bool) -> Result<(), DocumentError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut json = to_json(stream, pretty)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}
