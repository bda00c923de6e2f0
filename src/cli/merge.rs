//! Merge command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::document::{load_stream, save_stream};
use crate::merge::Merger;
use crate::models::Stream;

use super::{expand_inputs, resolve_config, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the merge command
pub fn run_merge(
    inputs: &[PathBuf],
    output: &Path,
    overrides: &CliOverrides,
    report: bool,
    config_path: Option<&Path>,
) -> ExitCode {
    let config = match resolve_config(config_path, overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let files = expand_inputs(inputs);
    if files.is_empty() {
        eprintln!("Error: No stream documents found in the given inputs");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut dest = Stream::new();
    dest.loop_count = config.merge.loop_count;
    let mut merger = Merger::with_options(dest, config.merge.options());

    for file in &files {
        let src = match load_stream(file) {
            Ok(src) => src,
            Err(e) => {
                eprintln!("Error: {}: {}", file.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        };
        if let Err(e) = merger.merge_all(&src) {
            eprintln!("Error: {}: {}", file.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    let summary = merger.report();
    let merged = merger.into_stream();
    if let Err(e) = save_stream(&merged, output, config.output.pretty) {
        eprintln!("Error: Failed to save '{}': {}", output.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    if report {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        println!(
            "Merged {} frame(s) from {} file(s) into {} ({} shared colors, {} local palette(s))",
            summary.frames,
            files.len(),
            output.display(),
            summary.shared_colors,
            summary.local_palettes
        );
    }

    ExitCode::from(EXIT_SUCCESS)
}
