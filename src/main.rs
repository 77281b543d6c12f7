//! Main entry point for the `pagelock` CLI.
//!
//! Parses arguments, dispatches to the appropriate command handler, and
//! handles errors with proper exit codes. The lock protocol itself lives in
//! the `pagelock` library crate.

mod cli;
mod commands;

use cli::Cli;
use pagelock::exit_codes;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Initialize structured logging to stderr, filtered by `RUST_LOG`
/// (default: warnings only, so CLI output stays clean).
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
