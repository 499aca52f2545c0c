use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod report;
mod shell;

use crate::shell::Shell;

/// An interactive multi-core process scheduler simulator.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file read by `initialize`
    #[arg(long, default_value = "config.txt")]
    config: PathBuf,

    /// Where `report-util` writes the utilization report
    #[arg(long, default_value = "csopesy-log.txt")]
    report: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
    report::init_local_offset();

    let stdin = io::stdin();
    let mut shell = Shell::new(stdin.lock(), io::stdout(), args.config, args.report);
    shell.run()
}

// Do not delete this line
#[cfg(test)]
mod tests;
