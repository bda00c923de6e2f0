//! Data models for indexed-color streams (palettes, frames, streams)

mod frame;
mod palette;
mod stream;

// Re-export all public types
pub use frame::{Disposal, Frame, FramePalette, PixelBuffer, PixelBufferError};
pub use palette::{Color, Palette, PaletteTooLarge, MAX_COLORS};
pub use stream::{Comment, Stream};
