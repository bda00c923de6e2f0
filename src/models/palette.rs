//! Palette and color types.

use crate::color::{format_hex_color, parse_hex_color};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Hard limit on palette entries for indexed-color frames.
pub const MAX_COLORS: usize = 256;

/// An opaque RGB palette entry.
///
/// Serialized as a `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hex_color(*self))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hex_color(&s).map_err(serde::de::Error::custom)
    }
}

/// Error returned when a palette would exceed [`MAX_COLORS`] entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("palette has {0} colors, at most {MAX_COLORS} are allowed")]
pub struct PaletteTooLarge(pub usize);

/// An ordered colormap of at most 256 colors, indexed by pixel value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Color>", into = "Vec<Color>")]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Create an empty palette.
    pub fn new() -> Self {
        Self { colors: Vec::with_capacity(MAX_COLORS) }
    }

    /// Create a palette from a list of colors.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteTooLarge`] if `colors` holds more than 256 entries.
    pub fn from_colors(colors: Vec<Color>) -> Result<Self, PaletteTooLarge> {
        if colors.len() > MAX_COLORS {
            return Err(PaletteTooLarge(colors.len()));
        }
        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.colors.len() >= MAX_COLORS
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    /// Append a color, returning its index, or `None` if the palette is full.
    pub fn push(&mut self, color: Color) -> Option<u8> {
        if self.is_full() {
            return None;
        }
        let index = self.colors.len() as u8;
        self.colors.push(color);
        Some(index)
    }

    /// Overwrite the color at `index`. Returns the previous color, or `None`
    /// (leaving the palette unchanged) if `index` is out of bounds.
    pub fn replace(&mut self, index: usize, color: Color) -> Option<Color> {
        self.colors.get_mut(index).map(|slot| std::mem::replace(slot, color))
    }

    /// Index of the first entry bit-exactly equal to `color`.
    pub fn position(&self, color: Color) -> Option<u8> {
        self.colors.iter().position(|&c| c == color).map(|i| i as u8)
    }
}

impl TryFrom<Vec<Color>> for Palette {
    type Error = PaletteTooLarge;

    fn try_from(colors: Vec<Color>) -> Result<Self, Self::Error> {
        Self::from_colors(colors)
    }
}

impl From<Palette> for Vec<Color> {
    fn from(palette: Palette) -> Self {
        palette.colors
    }
}
