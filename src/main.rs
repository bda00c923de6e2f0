//! cmapmerge - Command-line tool for merging indexed-color frame streams

use std::process::ExitCode;

use cmapmerge::cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    cli::run()
}
