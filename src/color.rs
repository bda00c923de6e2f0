//! Color parsing utilities for hex color strings
//!
//! Stream documents store palette entries as hex strings. Supported forms:
//! - `#RGB` (each digit is doubled)
//! - `#RRGGBB`
//!
//! Indexed palettes carry no alpha channel, so `#RGBA` and `#RRGGBBAA` are
//! rejected rather than silently truncated.

use crate::models::Color;
use thiserror::Error;

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Input string doesn't start with '#'
    #[error("color must start with '#'")]
    MissingHash,
    /// Invalid length (must be 3 or 6 hex chars after #)
    #[error("invalid color length {0}, expected 3 or 6")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// Parse a hex color string into a palette color.
///
/// # Examples
///
/// ```
/// use cmapmerge::color::parse_hex_color;
/// use cmapmerge::models::Color;
///
/// assert_eq!(parse_hex_color("#F00").unwrap(), Color::new(255, 0, 0));
/// assert_eq!(parse_hex_color("#1a2B3c").unwrap(), Color::new(0x1a, 0x2b, 0x3c));
/// assert!(parse_hex_color("red").is_err());
/// ```
///
/// # Errors
///
/// Returns `ColorError` if the input is not `#RGB` or `#RRGGBB`.
pub fn parse_hex_color(s: &str) -> Result<Color, ColorError> {
    if s.is_empty() {
        return Err(ColorError::Empty);
    }
    let hex = s.strip_prefix('#').ok_or(ColorError::MissingHash)?;

    let digits = hex.chars().map(parse_hex_digit).collect::<Result<Vec<u8>, _>>()?;

    match digits.as_slice() {
        [r, g, b] => Ok(Color::new(r * 17, g * 17, b * 17)),
        [r1, r0, g1, g0, b1, b0] => Ok(Color::new(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0)),
        _ => Err(ColorError::InvalidLength(digits.len())),
    }
}

/// Format a color as a lowercase `#rrggbb` string.
pub fn format_hex_color(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

/// Parse a single hex digit (0-9, A-F, a-f) to u8 (0-15)
fn parse_hex_digit(c: char) -> Result<u8, ColorError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(ColorError::InvalidHex(c)),
    }
}
