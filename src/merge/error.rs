//! Fatal merge errors.

use thiserror::Error;

/// An error that aborts merging the current source stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MergeError {
    /// The frame has no local palette and its stream has no shared one
    #[error("no shared or local palette for source frame{}", describe(.identifier))]
    MissingPalette { identifier: Option<String> },
    /// No slot could be found for a frame's transparent color
    #[error("no palette slot left for the transparent color")]
    TransparentSlotExhausted,
}

fn describe(identifier: &Option<String>) -> String {
    match identifier {
        Some(name) => format!(" '{}'", name),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_palette_message() {
        let named = MergeError::MissingPalette { identifier: Some("walk".to_string()) };
        assert_eq!(named.to_string(), "no shared or local palette for source frame 'walk'");
        let unnamed = MergeError::MissingPalette { identifier: None };
        assert_eq!(unnamed.to_string(), "no shared or local palette for source frame");
    }
}
