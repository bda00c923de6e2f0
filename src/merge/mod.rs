//! Colormap consolidation for indexed-color streams
//!
//! Frames from one or more source streams are appended to a destination
//! stream. Each frame's palette is folded into the destination's shared
//! palette when the used colors fit in 256 entries; otherwise the frame
//! keeps a compact palette of its own. Colors are only ever reused when they
//! are exactly equal.
//!
//! The pieces, leaf first:
//! - [`analyze()`]: which palette entries a frame actually uses
//! - [`try_merge_palette`]: all-or-nothing palette folding
//! - [`Merger::merge_image`]: one frame, including transparency and pixel remapping
//! - [`Merger::merge_stream`]: loop count and comments

mod analyze;
mod error;
mod frame;
mod palette;
mod state;
mod stream;

pub use analyze::analyze;
pub use error::MergeError;
pub use palette::{find_exact, try_merge_palette, PaletteMerge, PaletteOverflow};
pub use state::{PaletteState, Usage};
pub use stream::{MergeOptions, MergeReport, Merger};
