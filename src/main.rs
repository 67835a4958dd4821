//! Shellforge: build, classify and verify JavaScript engine shells for fuzzing.
//!
//! This is the main entry point for the `shellforge` CLI. It parses arguments,
//! sets up logging, dispatches to the appropriate command handler, and
//! handles errors with proper exit codes.

mod arch;
mod build;
mod classify;
mod cli;
mod commands;
mod config;
mod error;
mod events;
mod exit_codes;
mod planner;
mod platform;
mod profile;
mod vcs;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(if cli.verbose { "debug" } else { "info" });

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Log to stderr so command output on stdout stays machine-readable.
/// `RUST_LOG` overrides the level chosen on the command line.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shellforge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
