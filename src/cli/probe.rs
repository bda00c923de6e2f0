//! Probe command implementation

use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;

use crate::document::load_stream;
use crate::merge::{MergeOptions, Merger};

use super::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Debug, Serialize)]
struct Verdict {
    frame: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<String>,
    shared: bool,
}

/// Execute the probe command
///
/// Frames are merged in order on a scratch session, so each verdict
/// accounts for the slots taken by the frames before it.
pub fn run_probe(dest_path: &Path, src_path: &Path, json: bool) -> ExitCode {
    let (dest, src) = match (load_stream(dest_path), load_stream(src_path)) {
        (Ok(dest), Ok(src)) => (dest, src),
        (Err(e), _) => {
            eprintln!("Error: {}: {}", dest_path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
        (_, Err(e)) => {
            eprintln!("Error: {}: {}", src_path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let options = MergeOptions { warn_local_palettes: false, ..MergeOptions::default() };
    let mut merger = Merger::with_options(dest, options);
    merger.merge_stream(&src);

    let mut verdicts = Vec::with_capacity(src.frames.len());
    for (index, frame) in src.frames.iter().enumerate() {
        let shared = match merger.probe_frame(&src, frame) {
            Ok(shared) => shared,
            Err(e) => {
                eprintln!("Error: frame {}: {}", index, e);
                return ExitCode::from(EXIT_ERROR);
            }
        };
        if let Err(e) = merger.merge_image(&src, frame) {
            eprintln!("Error: frame {}: {}", index, e);
            return ExitCode::from(EXIT_ERROR);
        }
        verdicts.push(Verdict { frame: index, identifier: frame.identifier.clone(), shared });
    }

    if json {
        match serde_json::to_string_pretty(&verdicts) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        for verdict in &verdicts {
            let name =
                verdict.identifier.as_deref().map(|n| format!(" '{}'", n)).unwrap_or_default();
            println!(
                "frame {}{}: {}",
                verdict.frame,
                name,
                if verdict.shared { "shared" } else { "local" }
            );
        }
        let local = verdicts.iter().filter(|v| !v.shared).count();
        println!("{} of {} frame(s) need a local palette", local, verdicts.len());
    }

    ExitCode::from(EXIT_SUCCESS)
}
