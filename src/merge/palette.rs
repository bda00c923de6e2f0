//! Folding one palette's used colors into another.

use super::state::{PaletteState, Usage};
use crate::models::{Color, Palette};
use thiserror::Error;

/// A source palette's used colors do not fit in the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no destination slot left for source color {index}")]
pub struct PaletteOverflow {
    /// First source index that could not be placed
    pub index: u8,
}

/// Outcome of a successful palette merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteMerge {
    /// Every used source index resolved to the same destination index
    pub identity: bool,
    /// Entries appended to the destination
    pub added: usize,
}

/// Index of the first entry in `palette` bit-exactly equal to `color`.
///
/// There is no nearest-color fallback: near misses are `None`.
pub fn find_exact(palette: &Palette, color: Color) -> Option<u8> {
    palette.position(color)
}

/// Fold every entry of `src` marked [`Usage::Used`] into `dest`.
///
/// A destination slot is chosen per color, first match wins:
/// 1. the slot this entry resolved to last time, if it still holds the color
/// 2. an exact match already in `dest`
/// 3. a new entry appended to `dest`
/// 4. a `dest` slot that only served as some frame's transparent color
///
/// The resolved slots are recorded in `src_state` and tagged
/// [`Usage::Used`] in `dest_state`. Entries marked [`Usage::Transparent`] are
/// appended verbatim only when that keeps the mapping an identity; otherwise
/// they are left for the caller to place.
///
/// The merge is all-or-nothing: on [`PaletteOverflow`] neither `dest` nor
/// either state table has been modified.
pub fn try_merge_palette(
    dest: &mut Palette,
    dest_state: &mut PaletteState,
    src: &Palette,
    src_state: &mut PaletteState,
) -> Result<PaletteMerge, PaletteOverflow> {
    let mut staged = dest.clone();
    let mut staged_dest_state = dest_state.clone();
    let mut staged_src_state = src_state.clone();
    let mut identity = true;

    for (index, &color) in src.colors().iter().enumerate() {
        match src_state.usage(index) {
            Usage::Used => {
                let slot =
                    resolve_slot(&mut staged, &staged_dest_state, src_state.mapped(index), color)
                        .ok_or(PaletteOverflow { index: index as u8 })?;
                if slot as usize != index {
                    identity = false;
                }
                staged_src_state.set_mapped(index, slot);
                staged_dest_state.set_usage(slot as usize, Usage::Used);
            }
            Usage::Transparent if identity && index == staged.len() => {
                if let Some(slot) = staged.push(color) {
                    staged_dest_state.set_usage(slot as usize, Usage::Transparent);
                }
            }
            Usage::Transparent | Usage::Unused => {}
        }
    }

    let added = staged.len() - dest.len();
    *dest = staged;
    *dest_state = staged_dest_state;
    *src_state = staged_src_state;
    Ok(PaletteMerge { identity, added })
}

fn resolve_slot(
    dest: &mut Palette,
    dest_state: &PaletteState,
    previous: Option<u8>,
    color: Color,
) -> Option<u8> {
    if let Some(slot) = previous {
        if dest.get(slot as usize) == Some(color) {
            return Some(slot);
        }
    }
    if let Some(slot) = find_exact(dest, color) {
        return Some(slot);
    }
    if let Some(slot) = dest.push(color) {
        return Some(slot);
    }
    let slot = (0..dest.len()).find(|&i| dest_state.usage(i) == Usage::Transparent)?;
    dest.replace(slot, color);
    Some(slot as u8)
}
