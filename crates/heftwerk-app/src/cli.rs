// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const AFTER_HELP: &str = r#"EXAMPLES:
  # Assemble three photos into one PDF
  heftwerk build page1.jpg page2.jpg page3.png -o contract.pdf

  # Predict quality tier and size before capturing 25 pages
  heftwerk estimate --count 25

  # Validate an upload and write a smaller draft copy
  heftwerk check scan.pdf --compress -o scan-draft.pdf

ENVIRONMENT VARIABLES:
  RUST_LOG          Overrides the log filter (e.g. heftwerk_document=debug)
  HEFTWERK_CONFIG   JSON pipeline configuration file
"#;

/// Turn captured document photos into a single A4 PDF.
#[derive(Parser, Debug)]
#[command(
    name = "heftwerk",
    version,
    about = "Turn captured document photos into a single A4 PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
pub struct Cli {
    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "HEFTWERK_VERBOSE")]
    pub verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "HEFTWERK_QUIET", conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble images, in the order given, into one PDF.
    Build(BuildArgs),
    /// Show the quality tier and predicted PDF size for a page count.
    Estimate(EstimateArgs),
    /// Validate a single upload and optionally write a compressed copy.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Image files, one page each.
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Where to write the PDF.
    #[arg(short, long)]
    pub output: PathBuf,

    /// JSON pipeline configuration.
    #[arg(long, env = "HEFTWERK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Images normalized concurrently per batch.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Normalize on the calling thread instead of a worker pool.
    #[arg(long)]
    pub no_pool: bool,

    /// Title stored in the PDF metadata.
    #[arg(long)]
    pub title: Option<String>,

    /// Disable the progress bar.
    #[arg(long, env = "HEFTWERK_NO_PROGRESS")]
    pub no_progress: bool,
}

#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Number of images that will be captured.
    #[arg(short = 'n', long)]
    pub count: usize,

    /// Print the estimate as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// File to validate.
    pub file: PathBuf,

    /// Write a compressed copy (requires --output).
    #[arg(long)]
    pub compress: bool,

    /// Destination for the compressed copy.
    #[arg(short, long, requires = "compress")]
    pub output: Option<PathBuf>,

    /// JSON pipeline configuration (upload rules and draft settings).
    #[arg(long, env = "HEFTWERK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the validation report as JSON.
    #[arg(long)]
    pub json: bool,
}
