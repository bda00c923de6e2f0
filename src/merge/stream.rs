//! Stream-level merging and the merge session.

use super::analyze::analyze;
use super::error::MergeError;
use super::palette::{try_merge_palette, PaletteMerge, PaletteOverflow};
use super::state::{PaletteState, Usage};
use crate::models::{Comment, FramePalette, Palette, Stream};
use log::warn;
use serde::Serialize;

/// Behavior switches for a merge session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Do not carry source stream comments into the destination
    pub no_comments: bool,
    /// Warn (once) when a frame needs its own palette
    pub warn_local_palettes: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self { no_comments: false, warn_local_palettes: true }
    }
}

/// Counters describing what a merge session did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Frames appended to the destination
    pub frames: usize,
    /// Frames whose pixel data was copied without remapping
    pub identity_copies: usize,
    /// Frames that could not share the destination palette
    pub local_palettes: usize,
    /// Frames whose declared transparent index never occurred in the pixels
    pub transparency_dropped: usize,
    /// Size of the destination's shared palette
    pub shared_colors: usize,
}

/// A merge session that owns one destination stream.
///
/// The destination's shared palette is mutated in place and later frames
/// depend on slot allocations made for earlier ones, so every merge into a
/// destination goes through this type's `&mut self` methods.
///
/// # Examples
///
/// ```
/// use cmapmerge::merge::Merger;
/// use cmapmerge::models::{Color, Frame, Palette, PixelBuffer, Stream};
///
/// let palette = Palette::from_colors(vec![Color::new(255, 0, 0), Color::new(0, 0, 255)]).unwrap();
/// let mut src = Stream::with_global(palette);
/// src.frames.push(Frame::new(PixelBuffer::from_vec(2, 1, vec![0, 1]).unwrap()));
///
/// let mut merger = Merger::new(Stream::new());
/// let appended = merger.merge_all(&src).unwrap();
/// assert_eq!(appended, 1);
///
/// let merged = merger.into_stream();
/// assert_eq!(merged.global.unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub struct Merger {
    pub(super) dest: Stream,
    /// Usage tags for the destination's shared palette
    pub(super) dest_state: PaletteState,
    /// Scratch for the current source stream's shared palette
    pub(super) source_state: PaletteState,
    pub(super) report: MergeReport,
    options: MergeOptions,
    warned_local_palettes: bool,
}

impl Merger {
    /// Start a session with default options.
    pub fn new(dest: Stream) -> Self {
        Self::with_options(dest, MergeOptions::default())
    }

    /// Start a session. A destination without a shared palette gets an
    /// empty one. Slots painted by frames already in `dest` are recorded so
    /// they are not handed out as transparent slots.
    pub fn with_options(mut dest: Stream, options: MergeOptions) -> Self {
        let global = dest.global.get_or_insert_with(Palette::new);
        let mut dest_state = PaletteState::new();
        let mut frame_state = PaletteState::new();

        for frame in dest.frames.iter().filter(|f| f.palette == FramePalette::Shared) {
            analyze(frame, global, &mut frame_state);
            for index in 0..global.len() {
                match frame_state.usage(index) {
                    Usage::Used => dest_state.set_usage(index, Usage::Used),
                    Usage::Transparent if dest_state.usage(index) == Usage::Unused => {
                        dest_state.set_usage(index, Usage::Transparent)
                    }
                    _ => {}
                }
            }
        }

        Self {
            dest,
            dest_state,
            source_state: PaletteState::new(),
            report: MergeReport::default(),
            options,
            warned_local_palettes: false,
        }
    }

    pub fn destination(&self) -> &Stream {
        &self.dest
    }

    pub fn into_stream(self) -> Stream {
        self.dest
    }

    /// Counters for everything merged so far.
    pub fn report(&self) -> MergeReport {
        MergeReport {
            shared_colors: self.dest.global.as_ref().map_or(0, Palette::len),
            ..self.report.clone()
        }
    }

    /// Merge `src`'s stream-level attributes into the destination.
    ///
    /// Forgets slot assignments left over from any previous source, adopts
    /// `src`'s loop count unless the destination already has one, and
    /// appends `src`'s comment fragments unless comments are suppressed.
    /// Frames are merged separately with [`Merger::merge_image`].
    pub fn merge_stream(&mut self, src: &Stream) {
        self.source_state.reset_mapping();

        if self.dest.loop_count.is_none() {
            self.dest.loop_count = src.loop_count;
        }

        if let Some(comment) = src.comment.as_ref().filter(|_| !self.options.no_comments) {
            self.dest.comment.get_or_insert_with(Comment::new).extend_from(comment);
        }
    }

    /// Merge `src`'s attributes and then every one of its frames.
    ///
    /// Returns the number of frames appended. Every frame is checked for a
    /// usable palette before any is merged, so a [`MergeError::MissingPalette`]
    /// leaves the destination's frames untouched.
    pub fn merge_all(&mut self, src: &Stream) -> Result<usize, MergeError> {
        if let Some(frame) = src.frames.iter().find(|f| src.palette_for(f).is_none()) {
            return Err(MergeError::MissingPalette { identifier: frame.identifier.clone() });
        }

        self.merge_stream(src);
        for frame in &src.frames {
            self.merge_image(src, frame)?;
        }
        Ok(src.frames.len())
    }

    /// Fold `src`'s used colors into the destination's shared palette.
    ///
    /// The first failure in a session logs a warning suggesting fewer
    /// colors; later failures are silent.
    pub fn try_merge_palette(
        &mut self,
        src: &Palette,
        src_state: &mut PaletteState,
    ) -> Result<PaletteMerge, PaletteOverflow> {
        let dest = self.dest.global.get_or_insert_with(Palette::new);
        let result = try_merge_palette(dest, &mut self.dest_state, src, src_state);

        if result.is_err() && self.options.warn_local_palettes && !self.warned_local_palettes {
            warn!("too many colors, had to use some local palettes");
            warn!("  (you may want to reduce the input to 256 colors)");
            self.warned_local_palettes = true;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, Frame, PixelBuffer};

    fn stream_with_comment(fragments: &[&str]) -> Stream {
        let mut stream = Stream::new();
        stream.comment = Some(fragments.iter().copied().collect());
        stream
    }

    #[test]
    fn test_new_creates_shared_palette() {
        let merger = Merger::new(Stream::new());
        assert_eq!(merger.destination().global, Some(Palette::new()));
    }

    #[test]
    fn test_loop_count_adopted_only_when_unset() {
        let mut src = Stream::new();
        src.loop_count = Some(0);

        let mut merger = Merger::new(Stream::new());
        merger.merge_stream(&src);
        assert_eq!(merger.destination().loop_count, Some(0));

        let mut dest = Stream::new();
        dest.loop_count = Some(5);
        let mut merger = Merger::new(dest);
        merger.merge_stream(&src);
        assert_eq!(merger.destination().loop_count, Some(5));
    }

    #[test]
    fn test_comments_appended_in_order() {
        let mut merger = Merger::new(stream_with_comment(&["first"]));
        merger.merge_stream(&stream_with_comment(&["second", "third"]));
        merger.merge_stream(&Stream::new());
        let comment = merger.destination().comment.as_ref().unwrap();
        assert_eq!(comment.fragments(), &["first", "second", "third"]);
    }

    #[test]
    fn test_comment_created_when_absent() {
        let mut merger = Merger::new(Stream::new());
        merger.merge_stream(&stream_with_comment(&["hello"]));
        assert_eq!(merger.destination().comment.as_ref().map(Comment::len), Some(1));
    }

    #[test]
    fn test_comments_suppressed() {
        let options = MergeOptions { no_comments: true, ..Default::default() };
        let mut merger = Merger::with_options(Stream::new(), options);
        merger.merge_stream(&stream_with_comment(&["hidden"]));
        assert!(merger.destination().comment.is_none());
    }

    #[test]
    fn test_merge_stream_resets_source_mapping() {
        let mut merger = Merger::new(Stream::new());
        merger.source_state.set_mapped(0, 7);
        merger.merge_stream(&Stream::new());
        assert_eq!(merger.source_state.mapped(0), None);
    }

    #[test]
    fn test_existing_frames_mark_destination_usage() {
        let palette = Palette::from_colors(vec![
            Color::new(0, 0, 0),
            Color::new(1, 1, 1),
            Color::new(2, 2, 2),
        ])
        .unwrap();
        let mut dest = Stream::with_global(palette);
        dest.frames.push(
            Frame::new(PixelBuffer::from_vec(2, 1, vec![0, 2]).unwrap()).with_transparent(2),
        );
        let merger = Merger::new(dest);
        assert_eq!(merger.dest_state.usage(0), Usage::Used);
        assert_eq!(merger.dest_state.usage(1), Usage::Unused);
        assert_eq!(merger.dest_state.usage(2), Usage::Transparent);
    }

    #[test]
    fn test_merge_all_checks_palettes_first() {
        let mut src = Stream::new();
        src.frames.push(
            Frame::new(PixelBuffer::new(1, 1))
                .with_local_palette(Palette::from_colors(vec![Color::new(1, 2, 3)]).unwrap()),
        );
        src.frames.push(Frame::new(PixelBuffer::new(1, 1)));

        let mut merger = Merger::new(Stream::new());
        assert!(merger.merge_all(&src).is_err());
        assert!(merger.destination().frames.is_empty());
    }

    /// Warnings logged by the current test thread.
    mod capture {
        use log::{Level, LevelFilter, Log, Metadata, Record};
        use std::sync::Mutex;
        use std::thread::{self, ThreadId};

        static RECORDS: Mutex<Vec<(ThreadId, String)>> = Mutex::new(Vec::new());
        static LOGGER: Capture = Capture;

        struct Capture;

        impl Log for Capture {
            fn enabled(&self, metadata: &Metadata) -> bool {
                metadata.level() <= Level::Warn
            }

            fn log(&self, record: &Record) {
                if self.enabled(record.metadata()) {
                    let entry = (thread::current().id(), record.args().to_string());
                    RECORDS.lock().unwrap().push(entry);
                }
            }

            fn flush(&self) {}
        }

        pub fn install() {
            // Only the first call in the test binary installs the logger.
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(LevelFilter::Warn);
        }

        pub fn count(needle: &str) -> usize {
            let id = thread::current().id();
            let records = RECORDS.lock().unwrap();
            records.iter().filter(|(t, msg)| *t == id && msg.contains(needle)).count()
        }

        pub fn clear() {
            let id = thread::current().id();
            RECORDS.lock().unwrap().retain(|(t, _)| *t != id);
        }
    }

    /// Destination with no free slot and a source needing one for each of two frames.
    fn overflowing_pair() -> (Stream, Stream) {
        let full = (0..=255).map(|i| Color::new(i, 77, 77)).collect();
        let dest = Stream::with_global(Palette::from_colors(full).unwrap());
        let mut src = Stream::with_global(Palette::from_colors(vec![Color::new(1, 1, 1)]).unwrap());
        src.frames.push(Frame::new(PixelBuffer::new(1, 1)));
        src.frames.push(Frame::new(PixelBuffer::new(2, 1)));
        (dest, src)
    }

    #[test]
    fn test_local_palette_warning_logged_once() {
        capture::install();
        capture::clear();

        let (dest, src) = overflowing_pair();
        let mut merger = Merger::new(dest);
        merger.merge_all(&src).unwrap();
        merger.merge_all(&src).unwrap();
        assert_eq!(merger.report().local_palettes, 4);
        assert_eq!(capture::count("too many colors"), 1);
        assert_eq!(capture::count("reduce the input to 256 colors"), 1);
    }

    #[test]
    fn test_local_palette_warning_disabled() {
        capture::install();
        capture::clear();

        let (dest, src) = overflowing_pair();
        let options = MergeOptions { warn_local_palettes: false, ..MergeOptions::default() };
        let mut merger = Merger::with_options(dest, options);
        merger.merge_all(&src).unwrap();
        assert_eq!(merger.report().local_palettes, 2);
        assert_eq!(capture::count("too many colors"), 0);
    }

    #[test]
    fn test_report_counts() {
        let palette = Palette::from_colors(vec![Color::new(9, 9, 9)]).unwrap();
        let mut src = Stream::with_global(palette);
        src.frames.push(Frame::new(PixelBuffer::new(2, 2)));
        src.frames.push(Frame::new(PixelBuffer::new(2, 2)).with_transparent(0));

        let mut merger = Merger::new(Stream::new());
        assert_eq!(merger.merge_all(&src).unwrap(), 2);
        let report = merger.report();
        assert_eq!(report.frames, 2);
        // Slot 0 already holds the second frame's transparent color.
        assert_eq!(report.identity_copies, 2);
        assert_eq!(report.local_palettes, 0);
        assert_eq!(report.shared_colors, 1);
    }
}
