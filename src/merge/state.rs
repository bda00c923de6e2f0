//! Per-slot merge scratch state.
//!
//! Each palette taking part in a merge is paired with a [`PaletteState`]
//! holding, for every slot, how the current frame uses it and which
//! destination slot it was last resolved to.

use crate::models::MAX_COLORS;

/// How a palette slot is used by the frame being merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Usage {
    #[default]
    Unused,
    /// Referenced by at least one opaque pixel
    Used,
    /// Referenced only as the frame's transparent color
    Transparent,
}

/// Usage and resolved destination slot for every index of one palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteState {
    usage: [Usage; MAX_COLORS],
    mapped: [Option<u8>; MAX_COLORS],
}

impl Default for PaletteState {
    fn default() -> Self {
        Self { usage: [Usage::Unused; MAX_COLORS], mapped: [None; MAX_COLORS] }
    }
}

impl PaletteState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn usage(&self, index: usize) -> Usage {
        self.usage.get(index).copied().unwrap_or_default()
    }

    pub fn set_usage(&mut self, index: usize, usage: Usage) {
        if let Some(slot) = self.usage.get_mut(index) {
            *slot = usage;
        }
    }

    /// Destination slot this entry was last resolved to.
    pub fn mapped(&self, index: usize) -> Option<u8> {
        self.mapped.get(index).copied().flatten()
    }

    pub fn set_mapped(&mut self, index: usize, slot: u8) {
        if let Some(entry) = self.mapped.get_mut(index) {
            *entry = Some(slot);
        }
    }

    /// Mark every slot unused.
    pub fn reset_usage(&mut self) {
        self.usage = [Usage::Unused; MAX_COLORS];
    }

    /// Forget every resolved destination slot.
    pub fn reset_mapping(&mut self) {
        self.mapped = [None; MAX_COLORS];
    }

    /// Number of slots with the given usage.
    pub fn count(&self, usage: Usage) -> usize {
        self.usage.iter().filter(|&&u| u == usage).count()
    }
}
