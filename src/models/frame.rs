//! Frame types: pixel buffers, palette ownership, passthrough metadata.

use super::palette::Palette;
use super::stream::Comment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when pixel data does not match the declared dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pixel data has {actual} bytes, expected {width}x{height} = {expected}")]
pub struct PixelBufferError {
    pub width: u16,
    pub height: u16,
    pub expected: usize,
    pub actual: usize,
}

/// Serialized shape of a [`PixelBuffer`], validated on conversion.
#[derive(Serialize, Deserialize)]
struct RawPixelBuffer {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

/// An owned, row-major buffer of palette indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPixelBuffer", into = "RawPixelBuffer")]
pub struct PixelBuffer {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a zero-filled buffer.
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height, data: vec![0; width as usize * height as usize] }
    }

    /// Wrap existing row-major pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`PixelBufferError`] if `data.len() != width * height`.
    pub fn from_vec(width: u16, height: u16, data: Vec<u8>) -> Result<Self, PixelBufferError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(PixelBufferError { width, height, expected, actual: data.len() });
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Row `y`, or `None` if out of bounds.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let w = self.width as usize;
        if y >= self.height as usize {
            return None;
        }
        Some(&self.data[y * w..(y + 1) * w])
    }

    /// Mutable row `y`, or `None` if out of bounds.
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [u8]> {
        let w = self.width as usize;
        if y >= self.height as usize {
            return None;
        }
        Some(&mut self.data[y * w..(y + 1) * w])
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.height as usize).filter_map(move |y| self.row(y))
    }

    /// Pixel at `(x, y)`, or `None` if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.row(y).and_then(|row| row.get(x).copied())
    }
}

impl TryFrom<RawPixelBuffer> for PixelBuffer {
    type Error = PixelBufferError;

    fn try_from(raw: RawPixelBuffer) -> Result<Self, Self::Error> {
        Self::from_vec(raw.width, raw.height, raw.data)
    }
}

impl From<PixelBuffer> for RawPixelBuffer {
    fn from(buffer: PixelBuffer) -> Self {
        Self { width: buffer.width, height: buffer.height, data: buffer.data }
    }
}

/// Which palette governs a frame's pixel values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FramePalette {
    /// The enclosing stream's shared palette.
    #[default]
    Shared,
    /// A private palette owned by this frame.
    Local(Palette),
}

/// What a viewer does with the frame's area before drawing the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposal {
    #[default]
    None,
    Asis,
    Background,
    Previous,
}

/// One image of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub image: PixelBuffer,
    #[serde(default)]
    pub palette: FramePalette,
    /// Transparent palette index, `None` for a fully opaque frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent: Option<u8>,
    /// Display time in hundredths of a second
    #[serde(default)]
    pub delay: u16,
    #[serde(default)]
    pub disposal: Disposal,
    #[serde(default)]
    pub left: u16,
    #[serde(default)]
    pub top: u16,
    #[serde(default)]
    pub interlace: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Comment>,
}

impl Frame {
    /// Create a frame governed by the shared palette with default metadata.
    pub fn new(image: PixelBuffer) -> Self {
        Self { image, ..Default::default() }
    }

    pub fn with_local_palette(mut self, palette: Palette) -> Self {
        self.palette = FramePalette::Local(palette);
        self
    }

    pub fn with_transparent(mut self, index: u8) -> Self {
        self.transparent = Some(index);
        self
    }

    pub fn width(&self) -> u16 {
        self.image.width()
    }

    pub fn height(&self) -> u16 {
        self.image.height()
    }

    /// The frame's private palette, if it owns one.
    pub fn local_palette(&self) -> Option<&Palette> {
        match &self.palette {
            FramePalette::Local(palette) => Some(palette),
            FramePalette::Shared => None,
        }
    }
}
