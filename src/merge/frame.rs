//! Merging a single frame into the destination stream.

use super::analyze::analyze;
use super::error::MergeError;
use super::palette::try_merge_palette;
use super::state::{PaletteState, Usage};
use super::stream::Merger;
use crate::models::{Color, Frame, FramePalette, Palette, PixelBuffer, Stream, MAX_COLORS};
use log::debug;

/// Old pixel value to new pixel value.
struct Remap {
    table: [u8; MAX_COLORS],
    /// Output slots referenced by opaque pixels
    used: [bool; MAX_COLORS],
    identity: bool,
}

impl Remap {
    fn new() -> Self {
        Self { table: [0; MAX_COLORS], used: [false; MAX_COLORS], identity: true }
    }

    fn map_opaque(&mut self, from: usize, to: u8) {
        self.table[from] = to;
        self.used[to as usize] = true;
        if from != to as usize {
            self.identity = false;
        }
    }

    fn map_transparent(&mut self, from: u8, to: u8) {
        self.table[from as usize] = to;
        if from != to {
            self.identity = false;
        }
    }

    fn apply(&self, image: &PixelBuffer) -> PixelBuffer {
        let mut out = PixelBuffer::new(image.width(), image.height());
        for y in 0..image.height() as usize {
            if let (Some(src), Some(dst)) = (image.row(y), out.row_mut(y)) {
                for (d, &s) in dst.iter_mut().zip(src) {
                    *d = self.table[s as usize];
                }
            }
        }
        out
    }
}

/// Dense palette of every entry the frame uses, opaque or transparent.
///
/// The returned state maps each kept source index to its new slot.
fn compact_palette(palette: &Palette, state: &PaletteState) -> (Palette, PaletteState) {
    let mut local = Palette::new();
    let mut mapping = PaletteState::new();
    for (index, &color) in palette.colors().iter().enumerate() {
        if state.usage(index) == Usage::Unused {
            continue;
        }
        if let Some(slot) = local.push(color) {
            mapping.set_mapped(index, slot);
        }
    }
    (local, mapping)
}

/// Whether `index` may hold the frame's transparent color without sharing a
/// slot that carries opaque pixels, in this frame or in the shared palette.
fn is_free(remap: &Remap, dest_state: Option<&PaletteState>, index: usize) -> bool {
    !remap.used[index] && dest_state.map_or(true, |s| s.usage(index) != Usage::Used)
}

/// Whether the identity mapping can keep the transparent index `t`: this
/// frame paints nothing opaque there, and no other frame paints a different
/// color there.
fn keeps_index(
    remap: &Remap,
    dest: &Palette,
    dest_state: Option<&PaletteState>,
    t: usize,
    color: Color,
) -> bool {
    remap.identity
        && t < dest.len()
        && (is_free(remap, dest_state, t) || (!remap.used[t] && dest.get(t) == Some(color)))
}

/// Pick or create the output slot for the transparent color.
///
/// Preference order: the source index itself when the mapping is an
/// identity, the lowest slot nobody paints, the source index or lowest slot
/// this frame leaves unused, and finally a newly appended slot.
fn place_transparent(
    remap: &Remap,
    transparent: u8,
    color: Color,
    dest: &mut Palette,
    dest_state: Option<&mut PaletteState>,
) -> Option<u8> {
    let len = dest.len();
    let t = transparent as usize;
    let existing = {
        let state = dest_state.as_deref();
        if keeps_index(remap, dest, state, t, color) {
            Some(transparent)
        } else if let Some(i) = (0..len).find(|&i| is_free(remap, state, i)) {
            Some(i as u8)
        } else if remap.identity && t < len && !remap.used[t] {
            // Transparency is per frame, so another frame's opaque slot is still valid.
            Some(transparent)
        } else {
            (0..len).find(|&i| !remap.used[i]).map(|i| i as u8)
        }
    };

    let slot = existing.or_else(|| dest.push(color))?;
    if let Some(state) = dest_state {
        if state.usage(slot as usize) == Usage::Unused {
            state.set_usage(slot as usize, Usage::Transparent);
        }
    }
    Some(slot)
}

impl Merger {
    /// Merge one frame of `src` into the destination stream.
    ///
    /// The frame's palette is folded into the destination's shared palette
    /// when it fits; otherwise the output frame gets a compact local palette.
    /// Pixel data is copied verbatim when no index changes, and remapped
    /// otherwise. The new frame is appended and returned.
    ///
    /// `src` should have gone through [`Merger::merge_stream`] first so that
    /// slot assignments from an unrelated source are not reused.
    ///
    /// # Errors
    ///
    /// [`MergeError::MissingPalette`] if the frame has no local palette and
    /// `src` has no shared palette. Nothing is appended in that case.
    pub fn merge_image(&mut self, src: &Stream, frame: &Frame) -> Result<&Frame, MergeError> {
        let (palette, is_local) = match &frame.palette {
            FramePalette::Local(palette) => (palette, true),
            FramePalette::Shared => {
                let palette = src.global.as_ref().ok_or_else(|| MergeError::MissingPalette {
                    identifier: frame.identifier.clone(),
                })?;
                (palette, false)
            }
        };

        // Slot assignments persist across frames only for the source's shared palette.
        let mut state =
            if is_local { PaletteState::new() } else { std::mem::take(&mut self.source_state) };
        let result = self.build_frame(palette, frame, &mut state);
        if !is_local {
            self.source_state = state;
        }
        let output = result?;

        let index = self.dest.frames.len();
        self.dest.frames.push(output);
        Ok(&self.dest.frames[index])
    }

    /// Whether `frame` could share the destination palette right now.
    ///
    /// Nothing is modified, including the one-time local palette warning.
    pub fn probe_frame(&self, src: &Stream, frame: &Frame) -> Result<bool, MergeError> {
        let palette = src.palette_for(frame).ok_or_else(|| MergeError::MissingPalette {
            identifier: frame.identifier.clone(),
        })?;
        let mut state = match frame.palette {
            FramePalette::Local(_) => PaletteState::new(),
            FramePalette::Shared => self.source_state.clone(),
        };
        analyze(frame, palette, &mut state);

        let mut dest = self.dest.global.clone().unwrap_or_default();
        let mut dest_state = self.dest_state.clone();
        Ok(try_merge_palette(&mut dest, &mut dest_state, palette, &mut state).is_ok())
    }

    fn build_frame(
        &mut self,
        palette: &Palette,
        frame: &Frame,
        state: &mut PaletteState,
    ) -> Result<Frame, MergeError> {
        let frame_number = self.report.frames;
        let transparent = analyze(frame, palette, state);
        if frame.transparent.is_some() && transparent.is_none() {
            debug!("frame {}: declared transparency never used, dropping it", frame_number);
            self.report.transparency_dropped += 1;
        }

        let mut local = match self.try_merge_palette(palette, state) {
            Ok(_) => None,
            Err(overflow) => {
                debug!("frame {}: {}, using a local palette", frame_number, overflow);
                Some(compact_palette(palette, state))
            }
        };

        let mut remap = Remap::new();
        {
            let mapping = local.as_ref().map_or(&*state, |(_, mapping)| mapping);
            for index in 0..palette.len() {
                if state.usage(index) != Usage::Used {
                    continue;
                }
                if let Some(slot) = mapping.mapped(index) {
                    remap.map_opaque(index, slot);
                }
            }
        }

        let mut out_transparent = None;
        if let Some(t) = transparent {
            let color = palette.get(t as usize).unwrap_or_default();
            let slot = match local.as_mut() {
                Some((local_palette, _)) => {
                    place_transparent(&remap, t, color, local_palette, None)
                }
                None => {
                    let shared = self.dest.global.get_or_insert_with(Palette::new);
                    place_transparent(&remap, t, color, shared, Some(&mut self.dest_state))
                }
            }
            .ok_or(MergeError::TransparentSlotExhausted)?;
            remap.map_transparent(t, slot);
            out_transparent = Some(slot);
        }

        let image = if remap.identity {
            self.report.identity_copies += 1;
            frame.image.clone()
        } else {
            remap.apply(&frame.image)
        };

        let palette = match local {
            Some((local_palette, _)) => {
                self.report.local_palettes += 1;
                FramePalette::Local(local_palette)
            }
            None => FramePalette::Shared,
        };
        debug!(
            "frame {}: {} palette, {} mapping",
            frame_number,
            if matches!(palette, FramePalette::Local(_)) { "local" } else { "shared" },
            if remap.identity { "identity" } else { "remapped" }
        );
        self.report.frames += 1;

        Ok(Frame {
            image,
            palette,
            transparent: out_transparent,
            delay: frame.delay,
            disposal: frame.disposal,
            left: frame.left,
            top: frame.top,
            interlace: frame.interlace,
            identifier: frame.identifier.clone(),
            comment: frame.comment.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Comment;

    fn palette(colors: &[(u8, u8, u8)]) -> Palette {
        Palette::from_colors(colors.iter().map(|&(r, g, b)| Color::new(r, g, b)).collect())
            .unwrap()
    }

    fn frame(width: u16, height: u16, data: Vec<u8>) -> Frame {
        Frame::new(PixelBuffer::from_vec(width, height, data).unwrap())
    }

    /// 256 distinct colors none of which collide with the small test palettes.
    fn full_palette() -> Palette {
        Palette::from_colors((0..MAX_COLORS).map(|i| Color::new(i as u8, 77, 77)).collect())
            .unwrap()
    }

    #[test]
    fn test_empty_destination_identity() {
        let src = Stream::with_global(palette(&[(255, 0, 0), (0, 0, 255)]));
        let f = frame(2, 2, vec![0, 1, 1, 0]);
        let mut merger = Merger::new(Stream::new());
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap().clone();
        assert_eq!(out.image, f.image);
        assert_eq!(out.palette, FramePalette::Shared);
        assert_eq!(merger.destination().global.as_ref(), src.global.as_ref());
        assert_eq!(merger.report().identity_copies, 1);
    }

    #[test]
    fn test_remap_into_existing_palette() {
        let dest = Stream::with_global(palette(&[(9, 9, 9), (0, 0, 255)]));
        let src = Stream::with_global(palette(&[(0, 0, 255), (255, 0, 0)]));
        let f = frame(3, 1, vec![0, 1, 0]);
        let mut merger = Merger::new(dest);
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        assert_eq!(out.image.as_bytes(), &[1, 2, 1]);
        let shared = merger.destination().global.as_ref().unwrap();
        assert_eq!(shared.len(), 3);
        assert_eq!(shared.get(2), Some(Color::new(255, 0, 0)));
    }

    #[test]
    fn test_overflow_falls_back_to_dense_local_palette() {
        let dest = Stream::with_global(full_palette());
        let src_palette = palette(&[(1, 1, 1), (0, 77, 77), (2, 2, 2), (3, 3, 3)]);
        let src = Stream::with_global(src_palette);
        let f = frame(3, 1, vec![3, 1, 3]);
        let mut merger = Merger::new(dest);
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        let local = out.local_palette().unwrap();
        assert_eq!(local.colors(), &[Color::new(0, 77, 77), Color::new(3, 3, 3)]);
        assert_eq!(out.image.as_bytes(), &[1, 0, 1]);
        assert_eq!(merger.destination().global.as_ref().unwrap().len(), MAX_COLORS);
        assert_eq!(merger.report().local_palettes, 1);
    }

    #[test]
    fn test_unused_transparency_is_dropped() {
        let colors: Vec<(u8, u8, u8)> = (0..8).map(|i| (i, i, i)).collect();
        let src = Stream::with_global(palette(&colors));
        let f = frame(2, 1, vec![0, 1]).with_transparent(5);
        let mut merger = Merger::new(Stream::new());
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        assert_eq!(out.transparent, None);
        assert_eq!(merger.dest_state.usage(5), Usage::Unused);
        assert_eq!(merger.report().transparency_dropped, 1);
    }

    #[test]
    fn test_transparent_kept_on_identity() {
        let src = Stream::with_global(palette(&[(1, 1, 1), (2, 2, 2)]));
        let f = frame(2, 1, vec![0, 1]).with_transparent(1);
        let mut merger = Merger::new(Stream::new());
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        assert_eq!(out.transparent, Some(1));
        assert_eq!(out.image.as_bytes(), &[0, 1]);
        assert_eq!(merger.dest_state.usage(1), Usage::Transparent);
    }

    /// Destination whose existing frame paints the given shared slots.
    fn dest_using(colors: &[(u8, u8, u8)], pixels: Vec<u8>) -> Stream {
        let mut dest = Stream::with_global(palette(colors));
        let width = pixels.len() as u16;
        dest.frames.push(frame(width, 1, pixels));
        dest
    }

    #[test]
    fn test_transparent_moves_to_lowest_unused_slot() {
        // Slot 1 already holds another frame's opaque color; slot 2 is free.
        let dest =
            dest_using(&[(1, 1, 1), (50, 50, 50), (60, 60, 60), (70, 70, 70)], vec![0, 1, 3]);
        let src = Stream::with_global(palette(&[(1, 1, 1), (2, 2, 2)]));
        let f = frame(2, 1, vec![0, 1]).with_transparent(1);
        let mut merger = Merger::new(dest);
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        assert_eq!(out.transparent, Some(2));
        assert_eq!(out.image.as_bytes(), &[0, 2]);
        assert_eq!(merger.destination().global.as_ref().unwrap().len(), 4);
        assert_eq!(merger.dest_state.usage(2), Usage::Transparent);
    }

    #[test]
    fn test_transparent_shares_other_frames_slot_when_none_is_free() {
        // Every shared slot is painted by the existing frame, so the identity
        // index stays and nothing is appended.
        let dest = dest_using(&[(1, 1, 1), (50, 50, 50), (60, 60, 60)], vec![0, 1, 2]);
        let src = Stream::with_global(palette(&[(1, 1, 1), (2, 2, 2)]));
        let f = frame(2, 1, vec![0, 1]).with_transparent(1);
        let mut merger = Merger::new(dest);
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        assert_eq!(out.transparent, Some(1));
        assert_eq!(out.image.as_bytes(), &[0, 1]);
        assert_eq!(merger.destination().global.as_ref().unwrap().len(), 3);
        assert_eq!(merger.report().identity_copies, 1);
    }

    #[test]
    fn test_transparent_kept_where_earlier_frame_painted_same_color() {
        let src = Stream::with_global(palette(&[(1, 1, 1), (2, 2, 2)]));
        let opaque = frame(2, 1, vec![0, 1]);
        let masked = frame(2, 1, vec![0, 1]).with_transparent(1);
        let mut merger = Merger::new(Stream::new());
        merger.merge_stream(&src);

        merger.merge_image(&src, &opaque).unwrap();
        let out = merger.merge_image(&src, &masked).unwrap();
        assert_eq!(out.transparent, Some(1));
        assert_eq!(out.image.as_bytes(), &[0, 1]);
        assert_eq!(merger.destination().global.as_ref(), src.global.as_ref());
        assert_eq!(merger.report().identity_copies, 2);
    }

    #[test]
    fn test_transparent_shares_opaque_slot_when_palette_full() {
        // Every shared slot is painted by the existing frame and there is no room left.
        let colors: Vec<(u8, u8, u8)> = (0..MAX_COLORS).map(|i| (i as u8, 5, 5)).collect();
        let pixels: Vec<u8> = (0..=255).collect();
        let dest = dest_using(&colors, pixels);
        let src = Stream::with_global(palette(&[(3, 5, 5), (9, 9, 9)]));
        let f = frame(2, 1, vec![0, 1]).with_transparent(1);
        let mut merger = Merger::new(dest);
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        assert_eq!(out.palette, FramePalette::Shared);
        assert_eq!(out.image.as_bytes(), &[3, 0]);
        assert_eq!(out.transparent, Some(0));
    }

    #[test]
    fn test_transparent_appended_when_no_slot_free() {
        let dest = Stream::with_global(palette(&[(2, 2, 2), (1, 1, 1)]));
        let src = Stream::with_global(palette(&[(1, 1, 1), (2, 2, 2), (3, 3, 3)]));
        let f = frame(3, 1, vec![0, 1, 2]).with_transparent(2);
        let mut merger = Merger::new(dest);
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        assert_eq!(out.transparent, Some(2));
        assert_eq!(out.image.as_bytes(), &[1, 0, 2]);
        let shared = merger.destination().global.as_ref().unwrap();
        assert_eq!(shared.get(2), Some(Color::new(3, 3, 3)));
        assert_eq!(merger.dest_state.usage(2), Usage::Transparent);
    }

    #[test]
    fn test_local_fallback_keeps_transparent_in_range() {
        let dest = Stream::with_global(full_palette());
        let colors: Vec<(u8, u8, u8)> = (0..6).map(|i| (i, i, i)).collect();
        let src = Stream::with_global(palette(&colors));
        let f = frame(3, 1, vec![0, 1, 5]).with_transparent(5);
        let mut merger = Merger::new(dest);
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        let local = out.local_palette().unwrap();
        assert_eq!(local.len(), 3);
        assert_eq!(out.transparent, Some(2));
        assert_eq!(out.image.as_bytes(), &[0, 1, 2]);
    }

    #[test]
    fn test_local_source_palette() {
        let src = Stream::new();
        let f = frame(2, 1, vec![1, 1]).with_local_palette(palette(&[(1, 1, 1), (2, 2, 2)]));
        let mut merger = Merger::new(Stream::new());
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        assert_eq!(out.palette, FramePalette::Shared);
        assert_eq!(out.image.as_bytes(), &[0, 0]);
    }

    #[test]
    fn test_missing_palette_emits_nothing() {
        let src = Stream::new();
        let f = frame(1, 1, vec![0]);
        let mut merger = Merger::new(Stream::new());
        merger.merge_stream(&src);

        let err = merger.merge_image(&src, &f).unwrap_err();
        assert!(matches!(err, MergeError::MissingPalette { .. }));
        assert!(merger.destination().frames.is_empty());
    }

    #[test]
    fn test_metadata_copied() {
        let src = Stream::with_global(palette(&[(1, 1, 1)]));
        let mut f = frame(1, 1, vec![0]);
        f.delay = 12;
        f.left = 3;
        f.top = 4;
        f.interlace = true;
        f.identifier = Some("blink".to_string());
        f.comment = Some(["a", "b"].into_iter().collect::<Comment>());
        let mut merger = Merger::new(Stream::new());
        merger.merge_stream(&src);

        let out = merger.merge_image(&src, &f).unwrap();
        assert_eq!(out.delay, 12);
        assert_eq!((out.left, out.top), (3, 4));
        assert!(out.interlace);
        assert_eq!(out.identifier.as_deref(), Some("blink"));
        assert_eq!(out.comment.as_ref().unwrap().fragments(), &["a", "b"]);
    }

    #[test]
    fn test_sharing_check_does_not_mutate() {
        let dest = Stream::with_global(full_palette());
        let src = Stream::with_global(palette(&[(200, 1, 1)]));
        let fits = Stream::with_global(palette(&[(0, 77, 77)]));
        let f = frame(1, 1, vec![0]);
        let merger = Merger::new(dest);

        assert!(!merger.probe_frame(&src, &f).unwrap());
        assert!(merger.probe_frame(&fits, &f).unwrap());
        assert_eq!(merger.destination().global.as_ref().unwrap().len(), MAX_COLORS);
        assert!(merger.destination().frames.is_empty());
    }
}
