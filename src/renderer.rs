//! Frame rendering to RGBA image buffers
//!
//! Rendering resolves every pixel through the frame's governing palette, so
//! two frames that render identically show the same visible colors no matter
//! how their palettes are arranged.

use crate::models::{Frame, Stream};
use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Transparent color used for the frame's transparent index
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Magenta color used for pixel values outside the palette
const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// Error type for rendering failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Requested frame does not exist
    #[error("frame {index} does not exist (stream has {count} frames)")]
    NoSuchFrame { index: usize, count: usize },
    /// Frame has neither a local nor a shared palette
    #[error("frame {0} has no palette to render with")]
    MissingPalette(usize),
}

/// Render frame `index` of `stream` at its own size.
///
/// The frame's transparent index renders as fully transparent black.
///
/// # Examples
///
/// ```
/// use cmapmerge::models::{Color, Frame, Palette, PixelBuffer, Stream};
/// use cmapmerge::renderer::render_frame;
///
/// let palette = Palette::from_colors(vec![Color::new(255, 0, 0)]).unwrap();
/// let mut stream = Stream::with_global(palette);
/// stream.frames.push(Frame::new(PixelBuffer::new(2, 2)));
///
/// let image = render_frame(&stream, 0).unwrap();
/// assert_eq!(image.dimensions(), (2, 2));
/// assert_eq!(image.get_pixel(1, 1).0, [255, 0, 0, 255]);
/// ```
pub fn render_frame(stream: &Stream, index: usize) -> Result<RgbaImage, RenderError> {
    let frame = stream
        .frames
        .get(index)
        .ok_or(RenderError::NoSuchFrame { index, count: stream.frames.len() })?;
    let palette = stream.palette_for(frame).ok_or(RenderError::MissingPalette(index))?;

    let lookup: Vec<Rgba<u8>> = (0..=u8::MAX)
        .map(|value| {
            if frame.transparent == Some(value) {
                return TRANSPARENT;
            }
            match palette.get(value as usize) {
                Some(c) => Rgba([c.r, c.g, c.b, 255]),
                None => MAGENTA,
            }
        })
        .collect();

    Ok(render_with(frame, &lookup))
}

fn render_with(frame: &Frame, lookup: &[Rgba<u8>]) -> RgbaImage {
    let mut image = RgbaImage::new(frame.width() as u32, frame.height() as u32);
    for (y, row) in frame.image.rows().enumerate() {
        for (x, &px) in row.iter().enumerate() {
            image.put_pixel(x as u32, y as u32, lookup[px as usize]);
        }
    }
    image
}

/// Render every frame of `stream`.
pub fn render_all(stream: &Stream) -> Result<Vec<RgbaImage>, RenderError> {
    (0..stream.frames.len()).map(|i| render_frame(stream, i)).collect()
}
