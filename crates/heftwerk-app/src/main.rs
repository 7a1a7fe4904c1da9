// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Heftwerk — captured document photos in, one A4 PDF out.
//
// Entry point. Parses arguments, initialises logging and dispatches to the
// subcommands.

mod cli;
mod commands;
mod output;
mod progress_bar;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The progress bar replaces info-level logs; RUST_LOG still wins.
    let show_progress = !cli.quiet && matches!(&cli.command, Command::Build(args) if !args.no_progress);
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "heftwerk starting");

    match cli.command {
        Command::Build(args) => commands::build(args, show_progress, cli.quiet).await,
        Command::Estimate(args) => commands::estimate(args),
        Command::Check(args) => commands::check(args, cli.quiet),
    }
}
