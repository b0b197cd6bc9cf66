//! Ascent Control - CLI for the Ascent progression engine
//!
//! Inspects and drives per-user progression stored under a data directory.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn main() -> Result<()> {
    // Quiet by default; ASCENT_LOG=debug for engine traces
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ASCENT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::run(cli)
}
