//! Info command implementation

use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;

use crate::document::load_stream;
use crate::models::{Frame, FramePalette, Stream};

use super::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Debug, Serialize)]
struct StreamInfo {
    frames: usize,
    shared_colors: Option<usize>,
    local_palettes: usize,
    loop_count: Option<u16>,
    comments: usize,
    frame_info: Vec<FrameInfo>,
}

#[derive(Debug, Serialize)]
struct FrameInfo {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<String>,
    width: u16,
    height: u16,
    /// Color count of the frame's local palette, if it has one
    local_colors: Option<usize>,
    transparent: Option<u8>,
    delay: u16,
}

impl FrameInfo {
    fn new(index: usize, frame: &Frame) -> Self {
        Self {
            index,
            identifier: frame.identifier.clone(),
            width: frame.width(),
            height: frame.height(),
            local_colors: match &frame.palette {
                FramePalette::Local(palette) => Some(palette.len()),
                FramePalette::Shared => None,
            },
            transparent: frame.transparent,
            delay: frame.delay,
        }
    }
}

fn describe(stream: &Stream) -> StreamInfo {
    StreamInfo {
        frames: stream.frames.len(),
        shared_colors: stream.global.as_ref().map(|p| p.len()),
        local_palettes: stream.local_palette_count(),
        loop_count: stream.loop_count,
        comments: stream.comment.as_ref().map_or(0, |c| c.len()),
        frame_info: stream.frames.iter().enumerate().map(|(i, f)| FrameInfo::new(i, f)).collect(),
    }
}

/// Execute the info command
pub fn run_info(input: &Path, json: bool) -> ExitCode {
    let stream = match load_stream(input) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error: {}: {}", input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let info = describe(&stream);

    if json {
        match serde_json::to_string_pretty(&info) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    println!("{}", input.display());
    match info.shared_colors {
        Some(n) => println!("  shared palette: {} colors", n),
        None => println!("  shared palette: none"),
    }
    println!("  frames: {} ({} with local palettes)", info.frames, info.local_palettes);
    match info.loop_count {
        Some(0) => println!("  loop: forever"),
        Some(n) => println!("  loop: {}", n),
        None => {}
    }
    if info.comments > 0 {
        println!("  comments: {}", info.comments);
    }
    for frame in &info.frame_info {
        let mut line = format!("  #{} {}x{}", frame.index, frame.width, frame.height);
        if let Some(name) = &frame.identifier {
            line.push_str(&format!(" '{}'", name));
        }
        if let Some(n) = frame.local_colors {
            line.push_str(&format!(" local palette {} colors", n));
        }
        if let Some(t) = frame.transparent {
            line.push_str(&format!(" transparent {}", t));
        }
        if frame.delay > 0 {
            line.push_str(&format!(" delay {}", frame.delay));
        }
        println!("{}", line);
    }

    ExitCode::from(EXIT_SUCCESS)
}
