//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod info;
mod merge;
mod probe;
mod render;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use glob::glob;

use crate::config::{load_config, merge_cli_overrides, CliOverrides, CmapConfig};

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Check if a path looks like a stream document (.json or .json5).
pub fn is_stream_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("json") | Some("json5"))
}

/// Find all stream documents in a directory (recursively), sorted by path.
pub fn find_stream_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let dir_str = dir.display().to_string();

    for pattern in ["json", "json5"] {
        if let Ok(paths) = glob(&format!("{}/**/*.{}", dir_str, pattern)) {
            files.extend(paths.filter_map(Result::ok));
        }
    }

    files.sort();
    files
}

/// Expand directory arguments into the stream documents they contain.
///
/// Plain files are passed through untouched, in argument order.
pub(crate) fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(find_stream_files(input));
        } else {
            files.push(input.clone());
        }
    }
    files
}

/// Load `cmapmerge.toml` (explicit path or discovered) and apply overrides.
pub(crate) fn resolve_config(
    path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<CmapConfig, ExitCode> {
    match load_config(path) {
        Ok(mut config) => {
            merge_cli_overrides(&mut config, overrides);
            let errors = config.validate();
            if errors.is_empty() {
                Ok(config)
            } else {
                for error in errors {
                    eprintln!("Error: {}", error);
                }
                Err(ExitCode::from(EXIT_INVALID_ARGS))
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// cmapmerge - merge indexed-color frame streams into one shared palette
#[derive(Parser)]
#[command(name = "cmapmerge")]
#[command(about = "Merge indexed-color frame streams, sharing one palette where possible")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge the frames of several streams into one stream
    Merge {
        /// Input stream documents (.json or .json5); directories are searched recursively
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output stream document
        #[arg(short, long)]
        output: PathBuf,

        /// Do not carry input comments into the output
        #[arg(long)]
        no_comments: bool,

        /// Do not warn when frames need local palettes
        #[arg(long)]
        no_warnings: bool,

        /// Loop count for the output, overriding the inputs'
        #[arg(long)]
        loop_count: Option<u16>,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// Print a JSON summary of the merge to stdout
        #[arg(long)]
        report: bool,

        /// Path to cmapmerge.toml (default: discovered from the current directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Report which frames of a stream would fit a destination's palette
    Probe {
        /// Destination stream document
        dest: PathBuf,

        /// Source stream document
        src: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show frames, palettes, and transparency of a stream
    Info {
        /// Stream document to inspect
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render frames of a stream to PNG
    Render {
        /// Stream document to render
        input: PathBuf,

        /// Output file or directory.
        /// If omitted: {input}_{frame}.png
        /// If directory (ends with /): dir/{input}_{frame}.png
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only render the frame at this index
        #[arg(short, long)]
        frame: Option<usize>,

        /// Scale output by integer factor (1-16, default from cmapmerge.toml or 1)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
        scale: Option<u8>,

        /// Path to cmapmerge.toml (default: discovered from the current directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Parse arguments and run the selected command.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            inputs,
            output,
            no_comments,
            no_warnings,
            loop_count,
            compact,
            report,
            config,
        } => {
            let overrides = CliOverrides {
                no_comments: no_comments.then_some(true),
                no_warnings: no_warnings.then_some(true),
                loop_count,
                compact: compact.then_some(true),
                scale: None,
            };
            merge::run_merge(&inputs, &output, &overrides, report, config.as_deref())
        }
        Commands::Probe { dest, src, json } => probe::run_probe(&dest, &src, json),
        Commands::Info { input, json } => info::run_info(&input, json),
        Commands::Render { input, output, frame, scale, config } => {
            let overrides = CliOverrides { scale, ..CliOverrides::default() };
            render::run_render(&input, output.as_deref(), frame, &overrides, config.as_deref())
        }
    }
}
