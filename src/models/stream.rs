//! Stream-level types: the frame sequence, shared palette, and comments.

use super::frame::{Frame, FramePalette};
use super::palette::Palette;
use serde::{Deserialize, Serialize};

/// Free-form text attached to a stream or frame, kept as ordered fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Comment {
    fragments: Vec<String>,
}

impl Comment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// Append every fragment of `other`, in order.
    pub fn extend_from(&mut self, other: &Comment) {
        self.fragments.extend(other.fragments.iter().cloned());
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Comment {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { fragments: iter.into_iter().map(Into::into).collect() }
    }
}

/// A multi-frame indexed-color image stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Shared palette used by every frame without a local palette
    #[serde(default, rename = "palette", skip_serializing_if = "Option::is_none")]
    pub global: Option<Palette>,
    #[serde(default)]
    pub frames: Vec<Frame>,
    /// Loop count, `None` when not explicitly set (0 loops forever)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Comment>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global(palette: Palette) -> Self {
        Self { global: Some(palette), ..Default::default() }
    }

    /// The palette that governs `frame`'s pixel values within this stream.
    pub fn palette_for<'a>(&'a self, frame: &'a Frame) -> Option<&'a Palette> {
        match &frame.palette {
            FramePalette::Local(palette) => Some(palette),
            FramePalette::Shared => self.global.as_ref(),
        }
    }

    /// Number of frames that carry their own palette.
    pub fn local_palette_count(&self) -> usize {
        self.frames.iter().filter(|f| f.local_palette().is_some()).count()
    }
}
