//! `bakery-settings` command-line entry point.

use std::process::ExitCode;

use bakery::cli::{execute, Cli};
use bakery::telemetry::{emit_startup_warnings, init_logging, LogConfig};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let settings = cli.resolve(None)?;

    // stdout carries command output; logs go to stderr
    init_logging(&settings.logging, &LogConfig::for_debug(settings.debug), false)?;
    emit_startup_warnings(&settings);

    execute(cli.command, &settings)
}
