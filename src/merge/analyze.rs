//! Color usage analysis for a single frame.

use super::state::{PaletteState, Usage};
use crate::models::{Frame, Palette, MAX_COLORS};

/// Record which entries of `palette` the frame's pixels actually use.
///
/// Usage in `state` is reset first. Every observed entry becomes
/// [`Usage::Used`]; the declared transparent entry becomes
/// [`Usage::Transparent`] if it occurs in the pixel data.
///
/// Returns the effective transparent index: the declared one if it is in
/// range and observed, otherwise `None`. Pixel values beyond the palette are
/// ignored.
pub fn analyze(frame: &Frame, palette: &Palette, state: &mut PaletteState) -> Option<u8> {
    state.reset_usage();

    let ncol = palette.len();
    let mut seen = [false; MAX_COLORS];
    for slot in seen.iter_mut().skip(ncol) {
        *slot = true;
    }
    // Stop scanning once every entry has turned up.
    let mut total = MAX_COLORS - ncol;

    for row in frame.image.rows() {
        if total == MAX_COLORS {
            break;
        }
        for &px in row {
            let slot = &mut seen[px as usize];
            if !*slot {
                *slot = true;
                total += 1;
            }
        }
    }

    for index in (0..ncol).filter(|&i| seen[i]) {
        state.set_usage(index, Usage::Used);
    }

    match frame.transparent {
        Some(t) if (t as usize) < ncol && seen[t as usize] => {
            state.set_usage(t as usize, Usage::Transparent);
            Some(t)
        }
        _ => None,
    }
}
