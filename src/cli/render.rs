//! Render command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::document::load_stream;
use crate::output::{frame_output_path, save_png, scale_image};
use crate::renderer::render_frame;

use super::{resolve_config, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the render command
pub fn run_render(
    input: &Path,
    output: Option<&Path>,
    frame: Option<usize>,
    overrides: &CliOverrides,
    config_path: Option<&Path>,
) -> ExitCode {
    let config = match resolve_config(config_path, overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let stream = match load_stream(input) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error: {}: {}", input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let indices: Vec<usize> = match frame {
        Some(index) if index >= stream.frames.len() => {
            eprintln!(
                "Error: frame {} does not exist ({} has {} frames)",
                index,
                input.display(),
                stream.frames.len()
            );
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        Some(index) => vec![index],
        None => (0..stream.frames.len()).collect(),
    };

    // A single explicit file name only makes sense for a single frame.
    let output = match output {
        Some(path)
            if indices.len() > 1 && !path.is_dir() && !path.to_string_lossy().ends_with('/') =>
        {
            eprintln!("Error: rendering {} frames needs a directory for -o", indices.len());
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        other => other,
    };

    for index in indices {
        let image = match render_frame(&stream, index) {
            Ok(image) => scale_image(image, config.output.scale),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        };

        let output_path = frame_output_path(input, index, output);
        if let Err(e) = save_png(&image, &output_path) {
            eprintln!("Error: Failed to save '{}': {}", output_path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
        println!("Saved: {}", output_path.display());
    }

    ExitCode::from(EXIT_SUCCESS)
}
