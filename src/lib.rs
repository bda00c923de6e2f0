//! cmapmerge - Library for merging indexed-color frame streams
//!
//! This library provides functionality to:
//! - Merge frames from several streams into one stream with a shared palette
//! - Fall back to compact per-frame palettes when the shared one is full
//! - Read and write stream documents as JSON
//! - Render frames to PNG images for inspection

pub mod cli;
pub mod color;
pub mod config;
pub mod document;
pub mod merge;
pub mod models;
pub mod output;
pub mod renderer;
